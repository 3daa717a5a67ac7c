//! FAQ records and the CSV dataset they are loaded from.

mod loader;

pub use loader::{load_faq_csv, FaqDataset};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqRecord {
    pub id: String,
    pub question: String,
    pub answer: String,
}

impl FaqRecord {
    pub fn new(id: impl Into<String>, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Id derived from the zero-based data-row index.
    pub fn row_id(row: usize) -> String {
        format!("qa_{}", row)
    }
}

/// A row that could not be ingested, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// Zero-based data-row index.
    pub row: usize,
    pub id: Option<String>,
    pub reason: String,
}
