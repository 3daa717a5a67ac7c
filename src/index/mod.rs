//! Vector index abstraction over the FAQ embeddings.
//!
//! The serving path only ever reads from the index; ingestion writes to it.
//! `PineconeIndex` talks to the hosted service, `MemoryIndex` keeps entries
//! in process.

mod memory;
mod pinecone;

pub use memory::MemoryIndex;
pub use pinecone::PineconeIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::AssistantError;
use crate::faq::FaqRecord;

/// Metadata stored next to each vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqMetadata {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: FaqMetadata,
}

impl IndexEntry {
    pub fn from_record(record: &FaqRecord, values: Vec<f32>) -> Self {
        Self {
            id: record.id.clone(),
            values,
            metadata: FaqMetadata {
                question: record.question.clone(),
                answer: record.answer.clone(),
            },
        }
    }
}

/// A single hit as reported by the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    /// Similarity score (higher = better).
    pub score: f32,
    pub metadata: Option<FaqMetadata>,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn name(&self) -> &str;

    /// Makes the index ready to accept vectors of `dimension`.
    async fn prepare(&self, _dimension: usize) -> Result<(), AssistantError> {
        Ok(())
    }

    /// Inserts or overwrites entries by id. Returns how many were written.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize, AssistantError>;

    /// Up to `top_k` nearest entries, best first.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>, AssistantError>;

    async fn count(&self) -> Result<usize, AssistantError>;
}
