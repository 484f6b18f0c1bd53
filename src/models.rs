use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A study project in the knowledge base. Only `title` is required on
/// input; missing fields are left empty and reported by validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(rename = "participants", default)]
    pub participant_count: u32,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(rename = "meeting_schedule", default)]
    pub schedule: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Recruiting,
}

/// A frequently asked question. Only `question` is required on input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Faq {
    #[serde(default)]
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Project,
    Faq,
}

/// A knowledge-base entry with its kind fixed at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Project(Arc<Project>),
    Faq(Arc<Faq>),
}

impl Record {
    /// Decide the kind of an untagged JSON record from its shape: a
    /// `question` field makes it an FAQ, a `title` field a project.
    pub fn from_json(value: serde_json::Value) -> anyhow::Result<Self> {
        if value.get("question").is_some() {
            Ok(Record::Faq(Arc::new(serde_json::from_value(value)?)))
        } else if value.get("title").is_some() {
            Ok(Record::Project(Arc::new(serde_json::from_value(value)?)))
        } else {
            anyhow::bail!("record has neither a title nor a question field")
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Project(_) => RecordKind::Project,
            Record::Faq(_) => RecordKind::Faq,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Project(p) => &p.id,
            Record::Faq(f) => &f.id,
        }
    }

    /// Project title or FAQ question.
    pub fn title(&self) -> &str {
        match self {
            Record::Project(p) => &p.title,
            Record::Faq(f) => &f.question,
        }
    }

    /// Project description or FAQ answer.
    pub fn content(&self) -> &str {
        match self {
            Record::Project(p) => &p.description,
            Record::Faq(f) => &f.answer,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Record::Project(p) => &p.tags,
            Record::Faq(f) => &f.tags,
        }
    }
}

/// Character span `[start, end]` (inclusive) matched inside one field value.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchSpan {
    pub field: String,
    pub value: String,
    /// Position inside an array field, `None` for scalar fields
    pub array_index: Option<usize>,
    pub indices: Vec<(usize, usize)>,
}

/// A ranked hit. `score` is a distance: 0.0 is a perfect match, 1.0 no match.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub record: Record,
    pub score: f64,
    pub matches: Vec<MatchSpan>,
}

/// Chat request
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Source citation returned with an answer (or a search hit).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub id: String,
    pub title: String,
    pub content: String,
    pub score: f64,
    #[serde(rename = "type")]
    pub kind: RecordKind,
}

/// Chat response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub message: String,
    pub sources: Vec<Source>,
}

/// Search query string parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
}

/// Search response
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub category: String,
    pub results: Vec<Source>,
}

/// A single chat turn sent to the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}
