use std::fmt;
use std::sync::Arc;

use crate::models::{Faq, Project, Record, SearchResult};
use crate::search::fuzzy::{FuzzyHit, FuzzyIndex, FuzzyOptions, FIELD_WEIGHTS};
use crate::store::RecordStore;

/// Results at or above this distance are dropped before merging. This is a
/// second, stricter cut applied after the engine's own `MATCH_THRESHOLD`.
pub const RELEVANCE_CUTOFF: f64 = 0.6;
/// Maximum merged results returned by `search_all`.
pub const MAX_RESULTS: usize = 5;

/// Topic inferred from the raw query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Project,
    Study,
    Schedule,
    Participation,
    General,
}

/// Checked in order; the first category with a matching keyword wins.
const CATEGORY_KEYWORDS: [(Category, &[&str]); 4] = [
    (Category::Project, &["프로젝트", "과제", "project"]),
    (Category::Study, &["스터디", "공부", "study", "학습"]),
    (Category::Schedule, &["일정", "시간", "언제", "when", "schedule"]),
    (Category::Participation, &["참여", "신청", "가입", "join", "apply"]),
];

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Project => "project",
            Category::Study => "study",
            Category::Schedule => "schedule",
            Category::Participation => "participation",
            Category::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "project" => Some(Category::Project),
            "study" => Some(Category::Study),
            "schedule" => Some(Category::Schedule),
            "participation" => Some(Category::Participation),
            "general" => Some(Category::General),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a query by case-insensitive keyword containment.
pub fn detect_category(query: &str) -> Category {
    let lower = query.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}

/// Independent fuzzy indexes over projects and FAQs, read-only after build.
pub struct SearchService {
    projects: FuzzyIndex<Project>,
    faqs: FuzzyIndex<Faq>,
}

impl SearchService {
    pub fn new(store: &RecordStore) -> Self {
        let options = FuzzyOptions::default();
        Self {
            projects: FuzzyIndex::build(&store.projects, &FIELD_WEIGHTS, options),
            faqs: FuzzyIndex::build(&store.faqs, &FIELD_WEIGHTS, options),
        }
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn faq_count(&self) -> usize {
        self.faqs.len()
    }

    pub fn search_projects(&self, query: &str) -> Vec<SearchResult> {
        relevant(self.projects.search(query), Record::Project)
    }

    pub fn search_faqs(&self, query: &str) -> Vec<SearchResult> {
        relevant(self.faqs.search(query), Record::Faq)
    }

    /// Projects then FAQs, stably sorted by score, capped at `MAX_RESULTS`.
    pub fn search_all(&self, query: &str) -> Vec<SearchResult> {
        let mut results = self.search_projects(query);
        results.extend(self.search_faqs(query));
        results.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(MAX_RESULTS);
        results
    }

    /// `search_all`, narrowed to records tagged with the category.
    pub fn search_by_category(&self, query: &str, category: Category) -> Vec<SearchResult> {
        let results = self.search_all(query);
        if category == Category::General {
            return results;
        }
        results
            .into_iter()
            .filter(|r| r.record.tags().iter().any(|t| t == category.as_str()))
            .collect()
    }
}

fn relevant<T>(hits: Vec<FuzzyHit<T>>, wrap: fn(Arc<T>) -> Record) -> Vec<SearchResult> {
    hits.into_iter()
        .filter(|h| h.score < RELEVANCE_CUTOFF)
        .map(|h| SearchResult {
            record: wrap(h.item),
            score: h.score,
            matches: h.matches,
        })
        .collect()
}
