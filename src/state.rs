use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::AppConfig;
use crate::core::errors::AssistantError;
use crate::embedding::{Embedder, OpenAiEmbedder};
use crate::index::{PineconeIndex, VectorIndex};
use crate::llm::{GeminiGenerator, Generator};
use crate::rag::FaqAssistant;

/// Shared, read-only state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub assistant: FaqAssistant,
    pub index: Arc<dyn VectorIndex>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, assistant: FaqAssistant, index: Arc<dyn VectorIndex>) -> Arc<Self> {
        Arc::new(AppState {
            config,
            assistant,
            index,
            started_at: Utc::now(),
        })
    }

    /// Builds the hosted providers and the answering pipeline.
    pub fn initialize(config: Arc<AppConfig>) -> Result<Arc<Self>, AssistantError> {
        let embedder = build_embedder(&config)?;
        let index = build_index(&config)?;
        let generator = build_generator(&config)?;
        let assistant = FaqAssistant::from_config(&config, embedder, index.clone(), generator);
        Ok(Self::new(config, assistant, index))
    }
}

pub fn build_embedder(config: &AppConfig) -> Result<Arc<dyn Embedder>, AssistantError> {
    let settings = &config.settings;
    Ok(Arc::new(OpenAiEmbedder::new(
        &settings.embedding,
        config.keys.openai.clone(),
        settings.http.timeout(),
    )?))
}

pub fn build_index(config: &AppConfig) -> Result<Arc<dyn VectorIndex>, AssistantError> {
    let settings = &config.settings;
    Ok(Arc::new(PineconeIndex::new(
        &settings.index,
        config.keys.pinecone.clone(),
        settings.http.timeout(),
    )?))
}

pub fn build_generator(config: &AppConfig) -> Result<Arc<dyn Generator>, AssistantError> {
    let settings = &config.settings;
    Ok(Arc::new(GeminiGenerator::new(
        &settings.generation,
        config.keys.google.clone(),
        settings.http.timeout(),
    )?))
}
