use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use std::io::ErrorKind;
use std::time::Duration;

use crate::config::{LlmConfig, MAX_LLM_TIMEOUT_SECS};
use crate::llm::error::{classify_failure, FailureSignal, ProviderError};
use crate::models::ChatMessage;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: Option<Usage>,
}

/// Text generation capability. Implementations own transport concerns
/// (timeouts, retries) and report only the final outcome.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<Completion, ProviderError>;

    /// Single user message.
    async fn simple_completion(
        &self,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<Completion, ProviderError> {
        self.complete(vec![ChatMessage::user(prompt)], options).await
    }

    /// System persona followed by one user message.
    async fn completion_with_system(
        &self,
        system: &str,
        user: &str,
        options: CompletionOptions,
    ) -> Result<Completion, ProviderError> {
        self.complete(
            vec![ChatMessage::system(system), ChatMessage::user(user)],
            options,
        )
        .await
    }

    /// True if a short probe prompt yields any text.
    async fn health_check(&self) -> bool {
        let options = CompletionOptions {
            temperature: 0.0,
            max_tokens: 10,
        };
        match self.simple_completion("Hello", options).await {
            Ok(completion) => !completion.content.is_empty(),
            Err(e) => {
                tracing::error!("LLM health check failed: {e}");
                false
            }
        }
    }
}

/// OpenAI-compatible or Ollama chat API over HTTP.
pub struct HttpProvider {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpProvider {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.min(MAX_LLM_TIMEOUT_SECS));
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .context("Failed to build LLM HTTP client")?;
        Ok(Self { client, config })
    }

    async fn send_once(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<Completion, ProviderError> {
        match self.config.provider.as_str() {
            "openai" => self.call_openai(messages, options).await,
            "ollama" => self.call_ollama(messages, options).await,
            other => {
                tracing::error!("Unknown LLM provider: {other}");
                Err(ProviderError::unknown())
            }
        }
    }

    // ─── OpenAI-compatible ───────────────────────────────

    async fn call_openai(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<Completion, ProviderError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            tracing::error!("LLM_API_KEY is not set; refusing to call OpenAI");
            return Err(ProviderError::unauthorized());
        };

        let url = format!("{}/v1/chat/completions", self.config.base_url.trim_end_matches('/'));
        let req = OpenAiChatRequest {
            model: &self.config.chat_model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&req)
            .send()
            .await
            .map_err(transport_failure)?;
        let resp = check_status(resp).await?;

        let body: OpenAiChatResponse = resp.json().await.map_err(transport_failure)?;
        Ok(Completion {
            content: body
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default(),
            usage: body.usage,
        })
    }

    // ─── Ollama ──────────────────────────────────────────

    async fn call_ollama(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<Completion, ProviderError> {
        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));
        let req = OllamaChatRequest {
            model: &self.config.chat_model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(transport_failure)?;
        let resp = check_status(resp).await?;

        let body: OllamaChatResponse = resp.json().await.map_err(transport_failure)?;
        let usage = match (body.prompt_eval_count, body.eval_count) {
            (Some(prompt), Some(completion)) => Some(Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };
        Ok(Completion {
            content: body.message.content,
            usage,
        })
    }
}

#[async_trait]
impl CompletionProvider for HttpProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<Completion, ProviderError> {
        let max_retries = self.config.max_retries;
        let mut retries = 0;
        loop {
            match self.send_once(&messages, options).await {
                Ok(completion) => {
                    if let Some(usage) = completion.usage {
                        tracing::debug!(
                            "LLM usage: prompt={} completion={} total={}",
                            usage.prompt_tokens,
                            usage.completion_tokens,
                            usage.total_tokens
                        );
                    }
                    return Ok(completion);
                }
                Err(e) if e.is_retryable() && retries < max_retries => {
                    retries += 1;
                    let delay = backoff(self.config.retry_base_delay_ms, retries);
                    tracing::warn!(
                        "LLM call failed with {} - retrying ({retries}/{max_retries} in {delay:?})",
                        e.kind.as_str()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Exponential delay: `base`, `2 * base`, `4 * base`, ...
fn backoff(base_ms: u64, retry: u32) -> Duration {
    let factor = 1u64 << retry.saturating_sub(1).min(10);
    Duration::from_millis(base_ms.saturating_mul(factor))
}

fn transport_failure(e: reqwest::Error) -> ProviderError {
    tracing::error!("LLM transport error: {e}");
    classify_failure(FailureSignal {
        error_type: None,
        status: e.status().map(|s| s.as_u16()),
        timed_out: e.is_timeout() || is_connection_abort(&e),
    })
}

/// The upstream closed the connection before a complete response arrived.
fn is_connection_abort(e: &reqwest::Error) -> bool {
    let mut source = e.source();
    while let Some(err) = source {
        if let Some(hyper_err) = err.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() || hyper_err.is_canceled() {
                return true;
            }
        }
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            if matches!(
                io_err.kind(),
                ErrorKind::ConnectionAborted
                    | ErrorKind::ConnectionReset
                    | ErrorKind::UnexpectedEof
                    | ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }
        source = err.source();
    }
    false
}

/// Pass successful responses through; map anything else onto the taxonomy.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::error!("LLM API returned {status}: {body}");

    let error_type = serde_json::from_str::<UpstreamErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.kind);
    Err(classify_failure(FailureSignal {
        error_type: error_type.as_deref(),
        status: Some(status.as_u16()),
        timed_out: false,
    }))
}

// ─── Wire types ──────────────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct UpstreamErrorBody {
    error: Option<UpstreamErrorDetail>,
}

#[derive(Deserialize)]
struct UpstreamErrorDetail {
    #[serde(rename = "type")]
    kind: Option<String>,
}
