use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::rag::ScoredFaq;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct SourceView {
    pub id: String,
    pub question: String,
    pub score: f32,
}

impl From<&ScoredFaq> for SourceView {
    fn from(source: &ScoredFaq) -> Self {
        Self {
            id: source.record.id.clone(),
            question: source.record.question.clone(),
            score: source.score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceView>,
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("ask", %request_id);
    tracing::info!(parent: &span, "Question received ({} chars)", payload.question.chars().count());

    let answer = match state.assistant.ask(&payload.question).instrument(span).await {
        Ok(answer) => answer,
        Err(err) => {
            tracing::warn!(%request_id, "Question failed: {}", err);
            return Err(ApiError::from(err));
        }
    };

    tracing::info!(%request_id, "Answered with {} sources", answer.sources.len());
    Ok(Json(AskResponse {
        sources: answer.sources.iter().map(SourceView::from).collect(),
        answer: answer.text,
    }))
}
