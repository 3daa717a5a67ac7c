#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use faq_assistant::core::config::defaults::default_settings;
use faq_assistant::core::config::{ApiKeys, AppConfig, Settings};
use faq_assistant::core::errors::{AssistantError, FailureKind, Service};
use faq_assistant::core::retry::RetryPolicy;
use faq_assistant::embedding::{Embedder, QueryEmbedder};
use faq_assistant::index::MemoryIndex;
use faq_assistant::llm::{GenerationRequest, Generator};
use faq_assistant::rag::{FaqAssistant, Ingestor, ResponseComposer, Retriever};

const VOCABULARY: [&str; 8] = ["pay", "paytm", "deliver", "return", "refund", "cash", "track", "order"];

/// Bag-of-keywords embedder: one dimension per vocabulary word.
#[derive(Default)]
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model(&self) -> &str {
        "keywords"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AssistantError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| {
                let text = text.to_lowercase();
                VOCABULARY
                    .iter()
                    .map(|word| if text.contains(word) { 1.0 } else { 0.01 })
                    .collect()
            })
            .collect())
    }
}

/// Answers payment questions from whatever FAQ text the prompt carries.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, AssistantError> {
        let prompt = request.user_text();
        self.prompts.lock().unwrap().push(prompt.clone());
        if prompt.contains("Paytm") && prompt.contains("Visa") {
            return Ok(" We accept Visa, Mastercard and PayPal. Unfortunately Paytm is not supported. ".to_string());
        }
        Ok("Please contact our support team for help.".to_string())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<String, AssistantError> {
        Err(AssistantError::external(
            Service::Generation,
            FailureKind::Status(503),
            "model overloaded",
        ))
    }
}

pub struct SlowGenerator;

#[async_trait]
impl Generator for SlowGenerator {
    fn name(&self) -> &str {
        "slow"
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<String, AssistantError> {
        Err(AssistantError::external(
            Service::Generation,
            FailureKind::Timeout,
            "operation timed out after 20s",
        ))
    }
}

pub const FAQ_CSV: &str = "Question,Answer\n\
What payment methods do you accept?,\"We accept Visa, Mastercard and PayPal.\"\n\
How long does delivery take?,Delivery takes 3-5 working days.\n\
How do I return an item?,Use the returns portal within 30 days.\n\
Does the website offer Cash on Delivery (COD)?,\"Currently, we do not offer Cash on Delivery.\"\n";

pub fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn test_config() -> AppConfig {
    let settings: Settings = serde_json::from_value(default_settings()).unwrap();
    let keys = ApiKeys::from_lookup(|name| Some(format!("test-{}", name))).unwrap();
    AppConfig { settings, keys }
}

pub fn ingestor(embedder: Arc<KeywordEmbedder>, index: Arc<MemoryIndex>) -> Ingestor {
    Ingestor::new(embedder, index, RetryPolicy::none(), &test_config().settings.ingest)
}

pub fn assistant(
    embedder: Arc<KeywordEmbedder>,
    index: Arc<MemoryIndex>,
    generator: Arc<dyn Generator>,
) -> FaqAssistant {
    let settings = test_config().settings;
    FaqAssistant::new(
        QueryEmbedder::new(embedder, RetryPolicy::none(), settings.app.max_question_chars),
        Retriever::new(index, RetryPolicy::none(), &settings.retrieval),
        ResponseComposer::new(generator, settings.app.store_name.clone(), &settings.generation),
    )
}
