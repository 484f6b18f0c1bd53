use crate::llm::error::ProviderError;
use crate::llm::prompts::classifier_prompt;
use crate::llm::provider::{CompletionOptions, CompletionProvider};

/// Near-deterministic, one-word answer.
pub const CLASSIFIER_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.1,
    max_tokens: 10,
};

/// Relevance policy: the reply must contain "YES" once trimmed and
/// upper-cased. Everything else, including empty output, is a rejection.
pub fn is_relevant_response(reply: &str) -> bool {
    reply.trim().to_uppercase().contains("YES")
}

/// Ask the provider whether `question` is about the community.
pub async fn classify(
    provider: &dyn CompletionProvider,
    question: &str,
) -> Result<bool, ProviderError> {
    let reply = provider
        .simple_completion(&classifier_prompt(question), CLASSIFIER_OPTIONS)
        .await?;
    let relevant = is_relevant_response(&reply.content);
    tracing::debug!("Classifier reply {:?} -> relevant={relevant}", reply.content);
    Ok(relevant)
}
