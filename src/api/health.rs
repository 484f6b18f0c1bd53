use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::api::ApiError;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "study-assistant";

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
    }))
}

/// GET /api/health/llm: probe the generation provider.
pub async fn llm_health(State(state): State<AppState>) -> Json<Value> {
    let healthy = state.provider.health_check().await;
    Json(json!({ "healthy": healthy }))
}

/// GET /
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "달레 스터디 챗봇 API 서버",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
