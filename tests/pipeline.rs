mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use common::{assistant, ingestor, write_csv, FailingGenerator, KeywordEmbedder, ScriptedGenerator, FAQ_CSV};
use faq_assistant::core::errors::{AssistantError, APOLOGY_MESSAGE, EMPTY_QUESTION_MESSAGE};
use faq_assistant::index::{MemoryIndex, VectorIndex};
use faq_assistant::rag::prompt::NOT_AVAILABLE_MESSAGE;
use faq_assistant::rag::Stage;

#[tokio::test]
async fn paytm_question_is_answered_from_the_payment_faq() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let index = Arc::new(MemoryIndex::new());
    let generator = Arc::new(ScriptedGenerator::default());
    let file = write_csv(FAQ_CSV);

    let report = ingestor(embedder.clone(), index.clone())
        .ingest_file(file.path())
        .await
        .unwrap();
    assert_eq!(report.upserted, 4);

    let assistant = assistant(embedder, index, generator.clone());
    let answer = assistant.ask("Can I pay with Paytm?").await.unwrap();

    assert_eq!(answer.sources[0].record.id, "qa_0");
    assert!(answer.text.contains("Visa"));
    assert!(answer.text.contains("Paytm is not supported"));
    assert!(!answer.text.starts_with(' '));

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("We accept Visa, Mastercard and PayPal."));
}

#[tokio::test]
async fn ingesting_twice_leaves_the_index_unchanged() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let index = Arc::new(MemoryIndex::new());
    let file = write_csv(FAQ_CSV);
    let ingestor = ingestor(embedder, index.clone());

    ingestor.ingest_file(file.path()).await.unwrap();
    let count = index.count().await.unwrap();
    let snapshot = index.get("qa_3").unwrap();
    ingestor.ingest_file(file.path()).await.unwrap();

    assert_eq!(index.count().await.unwrap(), count);
    assert_eq!(index.get("qa_3").unwrap(), snapshot);
}

#[tokio::test]
async fn edited_answer_is_served_after_reingestion() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let index = Arc::new(MemoryIndex::new());
    let generator = Arc::new(ScriptedGenerator::default());
    let ingestor = ingestor(embedder.clone(), index.clone());

    let original = write_csv(FAQ_CSV);
    ingestor.ingest_file(original.path()).await.unwrap();
    let edited = write_csv(&FAQ_CSV.replace(
        "Delivery takes 3-5 working days.",
        "Delivery now takes 1-2 working days.",
    ));
    ingestor.ingest_file(edited.path()).await.unwrap();

    let assistant = assistant(embedder, index.clone(), generator.clone());
    let answer = assistant.ask("How fast do you deliver?").await.unwrap();

    assert_eq!(index.count().await.unwrap(), 4);
    assert_eq!(answer.sources[0].record.answer, "Delivery now takes 1-2 working days.");
    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("1-2 working days"));
    assert!(!prompts[0].contains("3-5 working days"));
}

#[tokio::test]
async fn generator_failure_becomes_an_apology() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let index = Arc::new(MemoryIndex::new());
    let file = write_csv(FAQ_CSV);
    ingestor(embedder.clone(), index.clone())
        .ingest_file(file.path())
        .await
        .unwrap();

    let assistant = assistant(embedder, index, Arc::new(FailingGenerator));

    assert!(matches!(
        assistant.ask("Can I pay with Paytm?").await,
        Err(AssistantError::ExternalService { .. })
    ));
    assert_eq!(assistant.answer("Can I pay with Paytm?").await, APOLOGY_MESSAGE);
}

#[tokio::test]
async fn blank_question_never_reaches_a_provider() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let generator = Arc::new(ScriptedGenerator::default());
    let assistant = assistant(embedder.clone(), Arc::new(MemoryIndex::new()), generator.clone());

    assert!(matches!(assistant.ask("   ").await, Err(AssistantError::Input(_))));
    assert_eq!(assistant.answer("\n\t").await, EMPTY_QUESTION_MESSAGE);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert!(generator.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_index_gets_the_not_available_answer() {
    let generator = Arc::new(ScriptedGenerator::default());
    let assistant = assistant(
        Arc::new(KeywordEmbedder::default()),
        Arc::new(MemoryIndex::new()),
        generator.clone(),
    );

    let answer = assistant.ask("Can I pay with Paytm?").await.unwrap();

    assert_eq!(answer.text, NOT_AVAILABLE_MESSAGE);
    assert!(answer.sources.is_empty());
    assert!(generator.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn progress_moves_from_fetching_to_synthesizing() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let index = Arc::new(MemoryIndex::new());
    let generator = Arc::new(ScriptedGenerator::default());
    let file = write_csv(FAQ_CSV);
    ingestor(embedder.clone(), index.clone())
        .ingest_file(file.path())
        .await
        .unwrap();
    let assistant = assistant(embedder, index, generator);

    let stages = Mutex::new(Vec::new());
    let text = assistant
        .answer_with_progress("Can I pay with Paytm?", |stage| stages.lock().unwrap().push(stage))
        .await;

    assert!(text.contains("Paytm is not supported"));
    assert_eq!(
        *stages.lock().unwrap(),
        vec![Stage::FetchingContext, Stage::SynthesizingContext]
    );

    stages.lock().unwrap().clear();
    let rejected = assistant
        .answer_with_progress("  ", |stage| stages.lock().unwrap().push(stage))
        .await;
    assert_eq!(rejected, EMPTY_QUESTION_MESSAGE);
    assert!(stages.lock().unwrap().is_empty());
}
