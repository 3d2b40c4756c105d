use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::AppState;
use super::errors::ApiError;
use crate::FaqError;
use crate::faq::SearchOutcome;

/// `POST /insert` request body
#[derive(Debug, Deserialize)]
pub struct InsertRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct InsertResponse {
    pub success: bool,
    pub id: String,
}

/// `GET /search` query string; `q` arrives URL-encoded and is decoded by the extractor
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub top_k: Option<usize>,
}

#[inline]
pub async fn insert_handler(
    State(state): State<AppState>,
    payload: Result<Json<InsertRequest>, JsonRejection>,
) -> Result<Json<InsertResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected insert body: {}", rejection.body_text());
        ApiError::insert(FaqError::Validation(rejection.body_text()))
    })?;

    let outcome = state
        .faq
        .insert(&request.question, &request.answer)
        .await
        .map_err(ApiError::insert)?;

    Ok(Json(InsertResponse {
        success: true,
        id: outcome.id,
    }))
}

#[inline]
pub async fn search_handler(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchOutcome>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        debug!("Rejected search query: {}", rejection.body_text());
        ApiError::search(FaqError::Validation(rejection.body_text()))
    })?;

    let query = params.q.unwrap_or_default();
    let outcome = state
        .faq
        .search(&query, params.top_k)
        .await
        .map_err(ApiError::search)?;

    Ok(Json(outcome))
}

#[inline]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let embedder = state.faq.embedder().check_health().await;
    let records = state.faq.index().count().await;

    if let Err(e) = &embedder {
        warn!("Embedding provider health check failed: {}", e);
    }
    if let Err(e) = &records {
        warn!("Vector index health check failed: {}", e);
    }

    let healthy = embedder.is_ok() && records.is_ok();
    let body = json!({
        "status": if healthy { "ok" } else { "degraded" },
        "embedder": embedder.map_or_else(|e| e.to_string(), |()| "ok".to_string()),
        "records": records.ok(),
    });
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body))
}
