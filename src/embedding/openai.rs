use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::core::config::settings::EmbeddingSettings;
use crate::core::config::Secret;
use crate::core::errors::{AssistantError, Service};
use crate::core::http::{build_client, ensure_success};

/// OpenAI `/embeddings` client.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    base_url: String,
    model: String,
    dimensions: usize,
    api_key: Secret,
    client: Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(
        settings: &EmbeddingSettings,
        api_key: Secret,
        timeout: std::time::Duration,
    ) -> Result<Self, AssistantError> {
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            api_key,
            client: build_client(timeout)?,
        })
    }

    /// Only the text-embedding-3 family accepts a `dimensions` override.
    fn requested_dimensions(&self) -> Option<usize> {
        self.model
            .starts_with("text-embedding-3")
            .then_some(self.dimensions)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AssistantError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: self.requested_dimensions(),
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|err| AssistantError::from_transport(Service::Embedding, err))?;
        let res = ensure_success(Service::Embedding, res).await?;

        let mut payload: EmbeddingResponse = res
            .json()
            .await
            .map_err(|err| AssistantError::malformed(Service::Embedding, err.to_string()))?;

        if payload.data.len() != inputs.len() {
            return Err(AssistantError::malformed(
                Service::Embedding,
                format!(
                    "expected {} embeddings, got {}",
                    inputs.len(),
                    payload.data.len()
                ),
            ));
        }

        payload.data.sort_by_key(|item| item.index);
        let vectors: Vec<Vec<f32>> = payload.data.into_iter().map(|item| item.embedding).collect();

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(AssistantError::malformed(
                Service::Embedding,
                format!(
                    "embedding dimension {} does not match configured {}",
                    bad.len(),
                    self.dimensions
                ),
            ));
        }

        tracing::debug!("Embedded {} input(s) with {}", inputs.len(), self.model);
        Ok(vectors)
    }
}
