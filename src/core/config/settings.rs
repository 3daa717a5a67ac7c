//! Typed view of the merged configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::{GOOGLE_API_KEY_VAR, OPENAI_API_KEY_VAR, PINECONE_API_KEY_VAR};
use crate::core::errors::AssistantError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub generation: GenerationSettings,
    pub retrieval: RetrievalSettings,
    pub retry: RetrySettings,
    pub http: HttpSettings,
    pub ingest: IngestSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub store_name: String,
    pub max_question_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub model: String,
    pub dimensions: usize,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSettings {
    pub name: String,
    /// Data-plane host; resolved through the control plane when absent.
    pub host: Option<String>,
    #[serde(default)]
    pub namespace: String,
    pub metric: String,
    pub cloud: String,
    pub region: String,
    pub control_url: String,
    pub create_if_missing: bool,
    pub upsert_batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub min_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSettings {
    pub batch_size: usize,
    pub preview_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_in_flight: usize,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// An API key that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

#[derive(Debug, Clone)]
pub struct ApiKeys {
    pub openai: Secret,
    pub pinecone: Secret,
    pub google: Secret,
}

impl ApiKeys {
    pub fn from_env() -> Result<Self, AssistantError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves all three keys, reporting every missing one at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AssistantError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut fetch = |name: &'static str| {
            match lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                Some(value) => Secret::new(value),
                None => {
                    missing.push(name);
                    Secret::new(String::new())
                }
            }
        };

        let openai = fetch(OPENAI_API_KEY_VAR);
        let pinecone = fetch(PINECONE_API_KEY_VAR);
        let google = fetch(GOOGLE_API_KEY_VAR);

        if !missing.is_empty() {
            return Err(AssistantError::Config(format!(
                "Missing API keys. Please set {} in the environment",
                missing.join(", ")
            )));
        }

        Ok(ApiKeys {
            openai,
            pinecone,
            google,
        })
    }
}

/// Immutable configuration assembled once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: Settings,
    pub keys: ApiKeys,
}
