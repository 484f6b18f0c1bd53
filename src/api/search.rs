use axum::extract::{Query, State};
use axum::Json;

use crate::api::{ApiError, FieldError};
use crate::models::{SearchParams, SearchResponse, SearchResult, Source};
use crate::search::ranking::{detect_category, Category};
use crate::state::AppState;

/// GET /api/search?q=...&category=...: ranked records for a query.
///
/// A `category` naming a known category is used as-is; otherwise the
/// category is detected from the query text.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::Validation {
            message: "검색어가 필요합니다.".to_string(),
            details: vec![FieldError {
                field: "q".to_string(),
                message: "query is required".to_string(),
            }],
        });
    }

    let category = params
        .category
        .as_deref()
        .and_then(Category::parse)
        .unwrap_or_else(|| detect_category(&query));
    tracing::debug!("Search category for {query:?}: {category}");

    let service = state.search_service().await.map_err(|e| {
        tracing::error!("Failed to initialize search service: {e:#}");
        ApiError::SearchUnavailable
    })?;

    let results = service
        .search_by_category(&query, category)
        .iter()
        .map(to_source)
        .collect();

    Ok(Json(SearchResponse {
        query,
        category: category.to_string(),
        results,
    }))
}

/// Untruncated record content, identified by the record id.
fn to_source(result: &SearchResult) -> Source {
    Source {
        id: result.record.id().to_string(),
        title: result.record.title().to_string(),
        content: result.record.content().to_string(),
        score: result.score,
        kind: result.record.kind(),
    }
}
