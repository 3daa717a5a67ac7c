mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{assistant, ingestor, test_config, write_csv, FailingGenerator, KeywordEmbedder, SlowGenerator, ScriptedGenerator, FAQ_CSV};
use faq_assistant::core::errors::{APOLOGY_MESSAGE, EMPTY_QUESTION_MESSAGE};
use faq_assistant::index::MemoryIndex;
use faq_assistant::llm::Generator;
use faq_assistant::server::router::router;
use faq_assistant::state::AppState;

async fn app(generator: Arc<dyn Generator>) -> axum::Router {
    let embedder = Arc::new(KeywordEmbedder::default());
    let index = Arc::new(MemoryIndex::new());
    let file = write_csv(FAQ_CSV);
    ingestor(embedder.clone(), index.clone())
        .ingest_file(file.path())
        .await
        .unwrap();

    let assistant = assistant(embedder, index.clone(), generator);
    router(AppState::new(Arc::new(test_config()), assistant, index))
}

async fn post_ask(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/ask")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn ask_returns_answer_and_sources() {
    let app = app(Arc::new(ScriptedGenerator::default())).await;

    let (status, body) = post_ask(app, json!({ "question": "Can I pay with Paytm?" })).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"].as_str().unwrap().contains("Paytm is not supported"));
    assert_eq!(body["sources"][0]["id"], "qa_0");
    assert_eq!(body["sources"][0]["question"], "What payment methods do you accept?");
}

#[tokio::test]
async fn blank_question_is_a_bad_request() {
    let app = app(Arc::new(ScriptedGenerator::default())).await;

    let (status, body) = post_ask(app, json!({ "question": "  " })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["answer"], EMPTY_QUESTION_MESSAGE);
}

#[tokio::test]
async fn provider_failure_is_a_bad_gateway_with_apology() {
    let app = app(Arc::new(FailingGenerator)).await;

    let (status, body) = post_ask(app, json!({ "question": "Can I pay with Paytm?" })).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["answer"], APOLOGY_MESSAGE);
    assert!(!body["error"].as_str().unwrap().contains("overloaded"));
}

#[tokio::test]
async fn health_and_index_stats() {
    let app = app(Arc::new(ScriptedGenerator::default())).await;

    let (status, health) = get_json(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["index"], "memory");

    let (status, stats) = get_json(app, "/api/index/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["count"], 4);
}

#[tokio::test]
async fn config_endpoint_masks_api_keys() {
    let app = app(Arc::new(ScriptedGenerator::default())).await;

    let (status, config) = get_json(app, "/api/config").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(config["app"]["store_name"], "UK Mega Shop");
    assert!(!config.to_string().contains("test-OPENAI_API_KEY"));
}

#[tokio::test]
async fn provider_timeout_is_a_gateway_timeout_with_apology() {
    let app = app(Arc::new(SlowGenerator)).await;

    let (status, body) = post_ask(app, json!({ "question": "Can I pay with Paytm?" })).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["answer"], APOLOGY_MESSAGE);
    assert!(!body["error"].as_str().unwrap().contains("20s"));
}
