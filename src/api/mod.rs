pub mod chat;
pub mod health;
pub mod search;

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::llm::error::ProviderError;
use crate::state::AppState;

/// All HTTP routes. Unknown paths get a JSON 404 and a panicking handler
/// becomes a generic 500.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::health))
        .route("/api/health/llm", get(health::llm_health))
        .route("/api/chat", post(chat::chat))
        .route("/api/search", get(search::search))
        .fallback(health::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {detail}");
    ApiError::Internal("서버 내부 오류가 발생했습니다.".to_string()).into_response()
}

/// One rejected input field.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Request-boundary failure, rendered as `{"error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    Validation {
        message: String,
        details: Vec<FieldError>,
    },
    SearchUnavailable,
    Provider(ProviderError),
    Internal(String),
    NotFound,
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        ApiError::Provider(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message, "details": details })),
            )
                .into_response(),
            ApiError::SearchUnavailable => error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "검색 서비스 초기화에 실패했습니다.",
            ),
            ApiError::Provider(e) => {
                let status =
                    StatusCode::from_u16(e.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                error_body(status, &e.message)
            }
            ApiError::Internal(message) => error_body(StatusCode::INTERNAL_SERVER_ERROR, &message),
            ApiError::NotFound => {
                error_body(StatusCode::NOT_FOUND, "요청한 경로를 찾을 수 없습니다.")
            }
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
