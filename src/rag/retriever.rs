use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use crate::core::config::settings::RetrievalSettings;
use crate::core::errors::AssistantError;
use crate::core::retry::RetryPolicy;
use crate::faq::FaqRecord;
use crate::index::VectorIndex;

/// A FAQ entry together with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFaq {
    pub record: FaqRecord,
    pub score: f32,
}

#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    retry: RetryPolicy,
    top_k: usize,
    min_score: f32,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>, retry: RetryPolicy, settings: &RetrievalSettings) -> Self {
        Self {
            index,
            retry,
            top_k: settings.top_k,
            min_score: settings.min_score,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Up to `k` FAQ entries at or above the relevance threshold, best first.
    /// Ties keep the order the index reported them in.
    pub async fn retrieve(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredFaq>, AssistantError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let index = self.index.as_ref();
        let matches = self
            .retry
            .run("index query", || index.query(vector, k))
            .await?;

        let mut results = Vec::with_capacity(matches.len());
        for hit in matches {
            if !hit.score.is_finite() || hit.score < self.min_score {
                tracing::debug!("Dropping match {} with score {:.4}", hit.id, hit.score);
                continue;
            }
            let Some(metadata) = hit.metadata else {
                tracing::warn!("Match {} has no usable metadata; skipping", hit.id);
                continue;
            };
            results.push(ScoredFaq {
                record: FaqRecord::new(hit.id, metadata.question, metadata.answer),
                score: hit.score,
            });
        }

        // sort_by is stable
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(k);
        Ok(results)
    }
}
