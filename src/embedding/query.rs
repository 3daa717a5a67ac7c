use std::sync::Arc;

use super::Embedder;
use crate::core::errors::AssistantError;
use crate::core::retry::RetryPolicy;

/// Embeds user questions, rejecting unusable input before any network call.
#[derive(Clone)]
pub struct QueryEmbedder {
    embedder: Arc<dyn Embedder>,
    retry: RetryPolicy,
    max_chars: usize,
}

impl QueryEmbedder {
    pub fn new(embedder: Arc<dyn Embedder>, retry: RetryPolicy, max_chars: usize) -> Self {
        Self {
            embedder,
            retry,
            max_chars,
        }
    }

    /// Trims and checks the question; returns the text that will be embedded.
    pub fn validate<'a>(&self, text: &'a str) -> Result<&'a str, AssistantError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AssistantError::Input("question is empty".to_string()));
        }
        let chars = trimmed.chars().count();
        if chars > self.max_chars {
            return Err(AssistantError::Input(format!(
                "question is {} characters long, the limit is {}",
                chars, self.max_chars
            )));
        }
        Ok(trimmed)
    }

    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AssistantError> {
        let question = self.validate(text)?;
        let embedder = self.embedder.as_ref();
        self.retry
            .run("query embedding", || embedder.embed(question))
            .await
    }
}
