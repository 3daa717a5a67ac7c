//! In-process vector index with brute-force cosine similarity.

use std::sync::RwLock;

use async_trait::async_trait;

use super::{IndexEntry, IndexMatch, VectorIndex};
use crate::core::errors::{AssistantError, FailureKind, Service};

/// Entries are kept in first-insertion order; an upsert of an existing id
/// replaces it in place, so ties always resolve the same way.
#[derive(Default)]
pub struct MemoryIndex {
    entries: RwLock<Vec<IndexEntry>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a stored entry.
    pub fn get(&self, id: &str) -> Option<IndexEntry> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.iter().find(|entry| entry.id == id).cloned())
    }

    fn poisoned() -> AssistantError {
        AssistantError::external(
            Service::VectorIndex,
            FailureKind::MalformedResponse,
            "in-memory index lock poisoned",
        )
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert(&self, new_entries: Vec<IndexEntry>) -> Result<usize, AssistantError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        let written = new_entries.len();
        for entry in new_entries {
            match entries.iter_mut().find(|existing| existing.id == entry.id) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }
        Ok(written)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>, AssistantError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;

        let mut scored: Vec<IndexMatch> = entries
            .iter()
            .map(|entry| IndexMatch {
                id: entry.id.clone(),
                score: cosine_similarity(vector, &entry.values),
                metadata: Some(entry.metadata.clone()),
            })
            .collect();

        // sort_by is stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize, AssistantError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.len())
    }
}

/// Cosine similarity; 0.0 for empty, mismatched, or zero-norm vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32
}
