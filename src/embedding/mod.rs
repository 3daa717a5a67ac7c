//! Embedding providers and the query-side wrapper around them.

mod openai;
mod query;

pub use openai::OpenAiEmbedder;
pub use query::QueryEmbedder;

use async_trait::async_trait;

use crate::core::errors::{AssistantError, Service};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier; ingestion and queries must agree on it.
    fn model(&self) -> &str;

    /// One vector per input, in input order.
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AssistantError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AssistantError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AssistantError::malformed(Service::Embedding, "no embedding returned"))
    }
}
