//! Customer-support FAQ assistant: CSV ingestion into a vector index and
//! retrieval-augmented answers over it.

pub mod chat;
pub mod core;
pub mod embedding;
pub mod faq;
pub mod index;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
