//! Pinecone serverless index over its REST API.
//!
//! The control plane (`control_url`) is used to look up or create the index
//! and learn its data-plane host; vectors go to the data-plane host.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use super::{FaqMetadata, IndexEntry, IndexMatch, VectorIndex};
use crate::core::config::settings::IndexSettings;
use crate::core::config::Secret;
use crate::core::errors::{AssistantError, FailureKind, Service};
use crate::core::http::{build_client, ensure_success};

const API_VERSION: &str = "2024-07";
const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);
const READY_POLL_ATTEMPTS: u32 = 60;

pub struct PineconeIndex {
    settings: IndexSettings,
    api_key: Secret,
    client: Client,
    host: OnceCell<String>,
    ready_poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
    dimension: Option<usize>,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    namespace: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Deserialize)]
struct RawMatch {
    id: String,
    #[serde(default)]
    score: f32,
    metadata: Option<Value>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [IndexEntry],
    namespace: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    total_vector_count: usize,
    #[serde(default)]
    namespaces: std::collections::HashMap<String, NamespaceStats>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: usize,
}

impl PineconeIndex {
    pub fn new(
        settings: &IndexSettings,
        api_key: Secret,
        timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let host = OnceCell::new();
        if let Some(configured) = settings.host.as_deref().filter(|h| !h.trim().is_empty()) {
            let _ = host.set(normalize_host(configured));
        }

        Ok(Self {
            settings: settings.clone(),
            api_key,
            client: build_client(timeout)?,
            host,
            ready_poll_interval: READY_POLL_INTERVAL,
        })
    }

    #[cfg(test)]
    fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.ready_poll_interval = interval;
        self
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Api-Key", self.api_key.expose())
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    fn control_url(&self, path: &str) -> String {
        format!("{}{}", self.settings.control_url.trim_end_matches('/'), path)
    }

    /// `None` when the control plane reports the index does not exist.
    async fn describe(&self) -> Result<Option<IndexDescription>, AssistantError> {
        let url = self.control_url(&format!("/indexes/{}", self.settings.name));
        let res = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|err| AssistantError::from_transport(Service::VectorIndex, err))?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let res = ensure_success(Service::VectorIndex, res).await?;
        let description = res
            .json::<IndexDescription>()
            .await
            .map_err(|err| AssistantError::malformed(Service::VectorIndex, err.to_string()))?;
        Ok(Some(description))
    }

    async fn create(&self, dimension: usize) -> Result<(), AssistantError> {
        let url = self.control_url("/indexes");
        let body = json!({
            "name": self.settings.name,
            "dimension": dimension,
            "metric": self.settings.metric,
            "spec": {
                "serverless": {
                    "cloud": self.settings.cloud,
                    "region": self.settings.region,
                }
            }
        });

        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|err| AssistantError::from_transport(Service::VectorIndex, err))?;

        // 409: somebody else created it in the meantime.
        if res.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        ensure_success(Service::VectorIndex, res).await?;
        tracing::info!(
            "Created Pinecone index '{}' (dimension {}, metric {})",
            self.settings.name,
            dimension,
            self.settings.metric
        );
        Ok(())
    }

    async fn wait_until_ready(&self) -> Result<IndexDescription, AssistantError> {
        for _ in 0..READY_POLL_ATTEMPTS {
            if let Some(description) = self.describe().await? {
                if description.status.ready {
                    return Ok(description);
                }
                tracing::debug!(
                    "Waiting for index '{}' ({})",
                    self.settings.name,
                    description.status.state
                );
            }
            tokio::time::sleep(self.ready_poll_interval).await;
        }

        Err(AssistantError::external(
            Service::VectorIndex,
            FailureKind::Timeout,
            format!("index '{}' did not become ready", self.settings.name),
        ))
    }

    async fn data_host(&self) -> Result<&str, AssistantError> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let description = self.describe().await?;
                description
                    .map(|description| normalize_host(&description.host))
                    .ok_or_else(|| {
                        AssistantError::external(
                            Service::VectorIndex,
                            FailureKind::Status(404),
                            format!(
                                "index '{}' does not exist; run ingestion first",
                                self.settings.name
                            ),
                        )
                    })
            })
            .await?;
        Ok(host.as_str())
    }

    async fn post_data<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, AssistantError> {
        let url = format!("{}{}", self.data_host().await?, path);
        let res = self
            .authorized(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|err| AssistantError::from_transport(Service::VectorIndex, err))?;
        ensure_success(Service::VectorIndex, res).await
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        &self.settings.name
    }

    async fn prepare(&self, dimension: usize) -> Result<(), AssistantError> {
        let description = match self.describe().await? {
            Some(description) if description.status.ready => {
                tracing::info!("Index '{}' already exists", self.settings.name);
                description
            }
            Some(description) => {
                tracing::info!(
                    "Index '{}' exists but is not ready ({})",
                    self.settings.name,
                    description.status.state
                );
                self.wait_until_ready().await?
            }
            None if self.settings.create_if_missing => {
                self.create(dimension).await?;
                self.wait_until_ready().await?
            }
            None => {
                return Err(AssistantError::Config(format!(
                    "Pinecone index '{}' does not exist and index.create_if_missing is false",
                    self.settings.name
                )))
            }
        };

        if let Some(existing) = description.dimension {
            if existing != dimension {
                return Err(AssistantError::Config(format!(
                    "Pinecone index '{}' has dimension {}, embeddings have {}",
                    self.settings.name, existing, dimension
                )));
            }
        }

        let _ = self.host.set(normalize_host(&description.host));
        Ok(())
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize, AssistantError> {
        let mut written = 0;
        for batch in entries.chunks(self.settings.upsert_batch_size.max(1)) {
            let body = UpsertRequest {
                vectors: batch,
                namespace: &self.settings.namespace,
            };
            let res = self.post_data("/vectors/upsert", &body).await?;
            let payload: UpsertResponse = res
                .json()
                .await
                .map_err(|err| AssistantError::malformed(Service::VectorIndex, err.to_string()))?;
            written += payload.upserted_count;
        }
        Ok(written)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>, AssistantError> {
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: &self.settings.namespace,
        };
        let res = self.post_data("/query", &body).await?;
        let payload: QueryResponse = res
            .json()
            .await
            .map_err(|err| AssistantError::malformed(Service::VectorIndex, err.to_string()))?;

        Ok(payload
            .matches
            .into_iter()
            .map(|raw| IndexMatch {
                metadata: raw
                    .metadata
                    .and_then(|value| serde_json::from_value::<FaqMetadata>(value).ok()),
                id: raw.id,
                score: raw.score,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, AssistantError> {
        let res = self.post_data("/describe_index_stats", &json!({})).await?;
        let stats: IndexStats = res
            .json()
            .await
            .map_err(|err| AssistantError::malformed(Service::VectorIndex, err.to_string()))?;

        if self.settings.namespace.is_empty() {
            return Ok(stats.total_vector_count);
        }
        Ok(stats
            .namespaces
            .get(&self.settings.namespace)
            .map(|ns| ns.vector_count)
            .unwrap_or(0))
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}
