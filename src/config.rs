use std::path::PathBuf;

/// Upper bound for a single provider request, in seconds.
pub const MAX_LLM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// JSON file holding the projects and FAQs
    pub data_path: PathBuf,
    /// Generation provider configuration
    pub llm: LlmConfig,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// "openai" or "ollama"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for classification and answers
    pub chat_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Per-request timeout in seconds (capped at 30)
    pub timeout_secs: u64,
    /// Additional attempts after a retryable failure
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry
    pub retry_base_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            data_path: PathBuf::from("./data/study-projects.json"),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: MAX_LLM_TIMEOUT_SECS,
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("PORT") {
            if port.parse::<u16>().is_ok() {
                config.bind_addr = format!("0.0.0.0:{port}");
            }
        }
        if let Ok(addr) = std::env::var("STUDY_ASSISTANT_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(path) = std::env::var("STUDY_ASSISTANT_DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("LLM_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.llm.timeout_secs = v.min(MAX_LLM_TIMEOUT_SECS);
            }
        }
        if let Ok(val) = std::env::var("LLM_MAX_RETRIES") {
            if let Ok(v) = val.parse() {
                config.llm.max_retries = v;
            }
        }
        if let Ok(val) = std::env::var("LLM_RETRY_BASE_DELAY_MS") {
            if let Ok(v) = val.parse() {
                config.llm.retry_base_delay_ms = v;
            }
        }

        config
    }
}
