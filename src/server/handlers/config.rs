use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use crate::core::config::redacted_view;
use crate::state::AppState;

pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(redacted_view(&state.config))
}
