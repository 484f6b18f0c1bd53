use serde::Serialize;

/// Closed set of failure categories surfaced by the generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    InvalidRequest,
    RateLimit,
    ApiError,
    Timeout,
    Unknown,
}

impl ProviderErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderErrorKind::InvalidRequest => "invalid_request",
            ProviderErrorKind::RateLimit => "rate_limit",
            ProviderErrorKind::ApiError => "api_error",
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::Unknown => "unknown",
        }
    }
}

/// A terminal provider failure with a client-safe message and HTTP status.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind:?} ({status}): {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub status: u16,
}

impl ProviderError {
    fn new(kind: ProviderErrorKind, message: &str, status: u16) -> Self {
        Self {
            kind,
            message: message.to_string(),
            status,
        }
    }

    pub fn invalid_request() -> Self {
        Self::new(
            ProviderErrorKind::InvalidRequest,
            "잘못된 요청입니다. 요청 형식을 확인해주세요.",
            400,
        )
    }

    pub fn rate_limit() -> Self {
        Self::new(
            ProviderErrorKind::RateLimit,
            "API 사용량 한도를 초과했습니다. 잠시 후 다시 시도해주세요.",
            429,
        )
    }

    pub fn unauthorized() -> Self {
        Self::new(
            ProviderErrorKind::ApiError,
            "API 키가 유효하지 않습니다.",
            401,
        )
    }

    pub fn forbidden() -> Self {
        Self::new(ProviderErrorKind::ApiError, "API 접근 권한이 없습니다.", 403)
    }

    pub fn upstream(status: u16) -> Self {
        Self::new(
            ProviderErrorKind::ApiError,
            "생성 API 서버 오류가 발생했습니다.",
            status,
        )
    }

    pub fn timeout() -> Self {
        Self::new(
            ProviderErrorKind::Timeout,
            "API 요청 시간이 초과되었습니다. 다시 시도해주세요.",
            408,
        )
    }

    pub fn unknown() -> Self {
        Self::new(ProviderErrorKind::Unknown, "알 수 없는 오류가 발생했습니다.", 500)
    }

    /// Worth another attempt at the transport level.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ProviderErrorKind::RateLimit | ProviderErrorKind::Timeout => true,
            ProviderErrorKind::ApiError => self.status >= 500,
            ProviderErrorKind::InvalidRequest | ProviderErrorKind::Unknown => false,
        }
    }
}

/// What the adapter observed about a failed call.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailureSignal<'a> {
    /// `error.type` from the upstream JSON body
    pub error_type: Option<&'a str>,
    pub status: Option<u16>,
    /// Transport timed out or the connection was aborted
    pub timed_out: bool,
}

/// Map a failure onto the taxonomy. The upstream error type wins over the
/// HTTP status, which wins over transport signals.
pub fn classify_failure(signal: FailureSignal<'_>) -> ProviderError {
    match signal.error_type {
        Some("invalid_request_error") => return ProviderError::invalid_request(),
        Some("rate_limit_exceeded") => return ProviderError::rate_limit(),
        Some("api_error") => return ProviderError::upstream(500),
        _ => {}
    }

    match signal.status {
        Some(401) => return ProviderError::unauthorized(),
        Some(403) => return ProviderError::forbidden(),
        Some(429) => return ProviderError::rate_limit(),
        Some(status @ 500..=599) => return ProviderError::upstream(status),
        _ => {}
    }

    if signal.timed_out {
        return ProviderError::timeout();
    }

    ProviderError::unknown()
}
