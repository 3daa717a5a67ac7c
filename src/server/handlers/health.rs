use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "started_at": state.started_at.to_rfc3339(),
        "index": state.index.name(),
    }))
}

pub async fn index_stats(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let count = state.index.count().await?;
    Ok(Json(json!({
        "index": state.index.name(),
        "count": count,
    })))
}
