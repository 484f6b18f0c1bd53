use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::{ApiError, FieldError};
use crate::models::{ChatRequest, ChatResponse};
use crate::pipeline::ChatPipeline;
use crate::state::AppState;

pub const MAX_MESSAGE_CHARS: usize = 1000;

/// POST /api/chat: answer a question about the community.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    // ── Step 1: Validate input ────────────────────────────
    let Json(req) = payload.map_err(|rejection| {
        invalid_request(FieldError {
            field: "body".to_string(),
            message: rejection.body_text(),
        })
    })?;
    validate_message(&req.message)?;

    // ── Step 2: Search service (built on first request) ──
    let search = state.search_service().await.map_err(|e| {
        tracing::error!("Failed to initialize search service: {e:#}");
        ApiError::SearchUnavailable
    })?;

    // ── Step 3: Gate, search, answer ──────────────────────
    let pipeline = ChatPipeline::new(state.provider.clone(), search);
    match pipeline.answer(&req.message).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!("Chat failed: {e}");
            Err(e.into())
        }
    }
}

fn validate_message(message: &str) -> Result<(), ApiError> {
    let len = message.chars().count();
    if len == 0 || len > MAX_MESSAGE_CHARS {
        return Err(invalid_request(FieldError {
            field: "message".to_string(),
            message: format!("must be between 1 and {MAX_MESSAGE_CHARS} characters (got {len})"),
        }));
    }
    Ok(())
}

fn invalid_request(detail: FieldError) -> ApiError {
    ApiError::Validation {
        message: "잘못된 요청 형식입니다.".to_string(),
        details: vec![detail],
    }
}
