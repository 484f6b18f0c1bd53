use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::models::{Faq, Project, Record};

/// Immutable, loaded-once collections of projects and FAQs.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    pub projects: Vec<Arc<Project>>,
    pub faqs: Vec<Arc<Faq>>,
}

impl RecordStore {
    /// Split untagged records into the two collections, keeping order.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut store = Self::default();
        for record in records {
            match record {
                Record::Project(p) => store.projects.push(p),
                Record::Faq(f) => store.faqs.push(f),
            }
        }
        store
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.faqs.is_empty()
    }
}

/// On-disk layout. Entries stay untyped until each one is classified.
#[derive(Debug, Default, Deserialize)]
struct RawStudyData {
    #[serde(default)]
    projects: Vec<serde_json::Value>,
    #[serde(default)]
    faqs: Vec<serde_json::Value>,
}

/// Load the knowledge base. Never fails: an unreadable or malformed file
/// is logged and yields an empty store, and an entry that cannot be read
/// as a record is skipped with a warning.
pub fn load_study_data(path: &Path) -> RecordStore {
    let raw = match read_study_data(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("Error loading study data: {e:#}");
            return RecordStore::default();
        }
    };

    let records = raw
        .projects
        .into_iter()
        .chain(raw.faqs)
        .enumerate()
        .filter_map(|(i, value)| match Record::from_json(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping entry {i} in {}: {e:#}", path.display());
                None
            }
        });
    let store = RecordStore::from_records(records);

    tracing::info!(
        "Loaded {} projects and {} FAQs",
        store.projects.len(),
        store.faqs.len()
    );
    if !validate_study_data(&store) {
        tracing::warn!(
            "Study data at {} has records with missing required fields",
            path.display()
        );
    }
    store
}

fn read_study_data(path: &Path) -> Result<RawStudyData> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).context("Failed to parse study data JSON")
}

/// Every project needs an id, title and description; every FAQ an id,
/// question and answer.
pub fn validate_study_data(store: &RecordStore) -> bool {
    let projects_ok = store
        .projects
        .iter()
        .all(|p| !p.id.is_empty() && !p.title.is_empty() && !p.description.is_empty());
    let faqs_ok = store
        .faqs
        .iter()
        .all(|f| !f.id.is_empty() && !f.question.is_empty() && !f.answer.is_empty());
    projects_ok && faqs_ok
}
