use crate::llm::error::ProviderError;
use crate::llm::prompts::{answer_prompt, ContextItem, SYSTEM_MESSAGE};
use crate::llm::provider::{CompletionOptions, CompletionProvider};
use crate::models::{ChatResponse, SearchResult, Source};

/// Generative stage: warmer sampling, longer output than the classifier.
pub const ANSWER_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.7,
    max_tokens: 1000,
};
/// Citations returned with an answer, regardless of how many results
/// were used as context.
pub const MAX_SOURCES: usize = 3;
/// Citation content is cut to this many characters.
pub const EXCERPT_CHARS: usize = 200;

impl From<&SearchResult> for ContextItem {
    fn from(result: &SearchResult) -> Self {
        Self {
            title: result.record.title().to_string(),
            content: result.record.content().to_string(),
            kind: result.record.kind(),
            score: result.score,
        }
    }
}

/// Lower-cased title with every whitespace run replaced by `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
        } else {
            slug.extend(c.to_lowercase());
            in_space = false;
        }
    }
    slug
}

/// First `EXCERPT_CHARS` characters, with `...` appended if anything was cut.
pub fn excerpt(content: &str) -> String {
    match content.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

pub fn citation(item: &ContextItem) -> Source {
    Source {
        id: slugify(&item.title),
        title: item.title.clone(),
        content: excerpt(&item.content),
        score: item.score,
        kind: item.kind,
    }
}

/// Generate a grounded answer for `question` from the merged results.
pub async fn compose(
    provider: &dyn CompletionProvider,
    question: &str,
    results: &[SearchResult],
) -> Result<ChatResponse, ProviderError> {
    let items: Vec<ContextItem> = results.iter().map(ContextItem::from).collect();
    let prompt = answer_prompt(question, &items);

    let answer = provider
        .completion_with_system(SYSTEM_MESSAGE, &prompt, ANSWER_OPTIONS)
        .await?;

    Ok(ChatResponse {
        message: answer.content,
        sources: items.iter().take(MAX_SOURCES).map(citation).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Faq, Record, RecordKind};
    use std::sync::Arc;

    fn item(content: &str) -> ContextItem {
        ContextItem {
            title: "Title".into(),
            content: content.into(),
            kind: RecordKind::Faq,
            score: 0.2,
        }
    }

    #[test]
    fn test_slugify_collapses_whitespace() {
        assert_eq!(slugify("Dale Design  System"), "dale-design-system");
        assert_eq!(slugify("리트코드 스터디"), "리트코드-스터디");
        assert_eq!(slugify(" a\tb "), "-a-b-");
    }

    #[test]
    fn test_excerpt_truncates_long_content() {
        let long = "가".repeat(250);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), EXCERPT_CHARS + 3);
        assert!(cut.ends_with("..."));
        assert!(cut.starts_with(&"가".repeat(EXCERPT_CHARS)));
    }

    #[test]
    fn test_excerpt_keeps_short_content() {
        let short = "a".repeat(150);
        assert_eq!(excerpt(&short), short);
        let exact = "b".repeat(EXCERPT_CHARS);
        assert_eq!(excerpt(&exact), exact);
    }

    #[test]
    fn test_citation_fields() {
        let source = citation(&item(&"x".repeat(250)));
        assert_eq!(source.id, "title");
        assert_eq!(source.title, "Title");
        assert_eq!(source.content.len(), 203);
        assert_eq!(source.kind, RecordKind::Faq);
    }

    #[test]
    fn test_context_item_from_faq_uses_question_and_answer() {
        let result = SearchResult {
            record: Record::Faq(Arc::new(Faq {
                id: "fee".into(),
                question: "참가비가 있나요?".into(),
                answer: "무료입니다".into(),
                keywords: vec![],
                tags: vec![],
            })),
            score: 0.3,
            matches: vec![],
        };
        let item = ContextItem::from(&result);
        assert_eq!(item.title, "참가비가 있나요?");
        assert_eq!(item.content, "무료입니다");
        assert_eq!(item.kind, RecordKind::Faq);
    }
}
