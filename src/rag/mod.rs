//! Retrieval-augmented answering over the FAQ index.
//!
//! Ingestion writes FAQ entries into the vector index; at question time the
//! retriever pulls the nearest entries and the composer asks the generator
//! to answer from them. `FaqAssistant` strings the query side together.

pub mod composer;
pub mod ingest;
pub mod pipeline;
pub mod prompt;
pub mod retriever;

pub use composer::ResponseComposer;
pub use ingest::{IngestReport, Ingestor};
pub use pipeline::{Answer, FaqAssistant, Stage};
pub use retriever::{Retriever, ScoredFaq};
