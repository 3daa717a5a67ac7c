use serde_json::{json, Value};

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const PINECONE_API_KEY_VAR: &str = "PINECONE_API_KEY";
pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Built-in settings; a user config file is deep-merged over these.
pub fn default_settings() -> Value {
    json!({
        "app": {
            "store_name": "UK Mega Shop",
            "max_question_chars": 2000
        },
        "embedding": {
            "model": "text-embedding-3-small",
            "dimensions": 1536,
            "base_url": "https://api.openai.com/v1"
        },
        "index": {
            "name": "ukmegashop-faq",
            "host": null,
            "namespace": "",
            "metric": "cosine",
            "cloud": "aws",
            "region": "us-east-1",
            "control_url": "https://api.pinecone.io",
            "create_if_missing": true,
            "upsert_batch_size": 100
        },
        "generation": {
            "model": "gemini-2.0-flash",
            "base_url": "https://generativelanguage.googleapis.com/v1beta",
            "temperature": 0.2,
            "max_output_tokens": 512
        },
        "retrieval": {
            "top_k": 3,
            "min_score": 0.2
        },
        "retry": {
            "max_attempts": 3,
            "initial_backoff_ms": 500,
            "max_backoff_ms": 8000
        },
        "http": {
            "timeout_secs": 20
        },
        "ingest": {
            "batch_size": 64,
            "preview_rows": 5
        },
        "server": {
            "host": "127.0.0.1",
            "port": 8000,
            "max_in_flight": 1,
            "cors_allowed_origins": []
        }
    })
}
