//! Offline FAQ ingestion: CSV -> embeddings -> vector index.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::config::settings::IngestSettings;
use crate::core::errors::{AssistantError, Service};
use crate::core::retry::RetryPolicy;
use crate::embedding::Embedder;
use crate::faq::{load_faq_csv, FaqDataset, FaqRecord, RowIssue};
use crate::index::{IndexEntry, VectorIndex};

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub total_rows: usize,
    pub upserted: usize,
    pub skipped: Vec<RowIssue>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    retry: RetryPolicy,
    batch_size: usize,
    preview_rows: usize,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        retry: RetryPolicy,
        settings: &IngestSettings,
    ) -> Self {
        Self {
            embedder,
            index,
            retry,
            batch_size: settings.batch_size.max(1),
            preview_rows: settings.preview_rows,
        }
    }

    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport, AssistantError> {
        let started_at = Utc::now();
        let dataset = load_faq_csv(path)?;
        self.ingest_dataset(&path.display().to_string(), dataset, started_at)
            .await
    }

    pub async fn ingest_dataset(
        &self,
        source: &str,
        dataset: FaqDataset,
        started_at: DateTime<Utc>,
    ) -> Result<IngestReport, AssistantError> {
        self.log_preview(source, &dataset);

        let mut upserted = 0;
        let mut prepared = false;

        for (batch_no, batch) in dataset.records.chunks(self.batch_size).enumerate() {
            let done = batch_no * self.batch_size;
            match self.ingest_batch(batch, &mut prepared).await {
                Ok(written) => {
                    upserted += written;
                    tracing::info!(
                        "Upserted {}/{} FAQ entries into {}",
                        upserted,
                        dataset.records.len(),
                        self.index.name()
                    );
                }
                Err(err) => {
                    let (uncertain, pending) = unconfirmed_ids(&dataset.records, done, batch.len());
                    tracing::error!(
                        "Ingestion of {} aborted after {} upserted entries; \
                         may be partially written: {}; not ingested: {}",
                        source,
                        upserted,
                        uncertain.join(", "),
                        pending.join(", ")
                    );
                    return Err(err);
                }
            }
        }

        let report = IngestReport {
            source: source.to_string(),
            total_rows: dataset.total_rows,
            upserted,
            skipped: dataset.issues,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            "Ingested {}: {} rows, {} upserted, {} skipped",
            report.source,
            report.total_rows,
            report.upserted,
            report.skipped.len()
        );
        Ok(report)
    }

    async fn ingest_batch(&self, batch: &[FaqRecord], prepared: &mut bool) -> Result<usize, AssistantError> {
        let questions: Vec<String> = batch.iter().map(|record| record.question.clone()).collect();
        let questions = questions.as_slice();
        let embedder = self.embedder.as_ref();
        let vectors = self
            .retry
            .run("FAQ embedding", || embedder.embed_batch(questions))
            .await?;

        if vectors.len() != batch.len() {
            return Err(AssistantError::malformed(
                Service::Embedding,
                format!("expected {} embeddings, got {}", batch.len(), vectors.len()),
            ));
        }

        let index = self.index.as_ref();
        if !*prepared {
            let dimension = vectors.first().map(Vec::len).unwrap_or_default();
            self.retry
                .run("index preparation", || index.prepare(dimension))
                .await?;
            *prepared = true;
        }

        let entries: Vec<IndexEntry> = batch
            .iter()
            .zip(vectors)
            .map(|(record, values)| IndexEntry::from_record(record, values))
            .collect();
        let entries = &entries;
        self.retry
            .run("index upsert", || index.upsert(entries.clone()))
            .await
    }

    fn log_preview(&self, source: &str, dataset: &FaqDataset) {
        tracing::info!(
            "Loaded {} FAQ entries from {} ({} rows, {} rejected)",
            dataset.records.len(),
            source,
            dataset.total_rows,
            dataset.issues.len()
        );
        for record in dataset.records.iter().take(self.preview_rows) {
            tracing::info!("  {}: {}", record.id, record.question);
        }
    }
}

/// Splits the ids left after a failed batch into the failed batch itself,
/// which the index may have partly stored, and the batches never sent.
fn unconfirmed_ids(records: &[FaqRecord], start: usize, batch_len: usize) -> (Vec<&str>, Vec<&str>) {
    let split = (start + batch_len).min(records.len());
    fn ids(slice: &[FaqRecord]) -> Vec<&str> {
        slice.iter().map(|record| record.id.as_str()).collect()
    }
    (ids(&records[start..split]), ids(&records[split..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::FailureKind;
    use crate::index::MemoryIndex;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps text onto a small vector keyed on a few words.
    struct WordEmbedder {
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    impl WordEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_after: None,
            }
        }
    }

    #[async_trait]
    impl Embedder for WordEmbedder {
        fn model(&self) -> &str {
            "words"
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AssistantError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| call >= limit) {
                return Err(AssistantError::external(
                    Service::Embedding,
                    FailureKind::Unauthorized,
                    "revoked",
                ));
            }
            Ok(texts
                .iter()
                .map(|text| {
                    let text = text.to_lowercase();
                    vec![
                        text.contains("pay") as u8 as f32 + 0.1,
                        text.contains("deliver") as u8 as f32 + 0.1,
                        text.contains("return") as u8 as f32 + 0.1,
                    ]
                })
                .collect())
        }
    }

    fn ingest_settings(batch_size: usize) -> IngestSettings {
        IngestSettings {
            batch_size,
            preview_rows: 2,
        }
    }

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const FAQ: &str = "Question,Answer\n\
What payment methods do you accept?,Visa and PayPal.\n\
How long does delivery take?,3-5 working days.\n\
,Orphan answer\n\
How do I return an item?,Use the returns portal.\n";

    #[tokio::test]
    async fn ingests_valid_rows_and_reports_skipped_ones() {
        let index = Arc::new(MemoryIndex::new());
        let ingestor = Ingestor::new(
            Arc::new(WordEmbedder::new()),
            index.clone(),
            RetryPolicy::none(),
            &ingest_settings(2),
        );
        let file = csv_file(FAQ);

        let report = ingestor.ingest_file(file.path()).await.unwrap();

        assert_eq!(report.total_rows, 4);
        assert_eq!(report.upserted, 3);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].row, 2);
        assert!(report.finished_at >= report.started_at);
        assert_eq!(index.count().await.unwrap(), 3);
        assert_eq!(index.get("qa_3").unwrap().metadata.answer, "Use the returns portal.");
    }

    #[tokio::test]
    async fn reingesting_the_same_file_is_idempotent() {
        let index = Arc::new(MemoryIndex::new());
        let ingestor = Ingestor::new(
            Arc::new(WordEmbedder::new()),
            index.clone(),
            RetryPolicy::none(),
            &ingest_settings(64),
        );
        let file = csv_file(FAQ);

        ingestor.ingest_file(file.path()).await.unwrap();
        let before = index.get("qa_0").unwrap();
        ingestor.ingest_file(file.path()).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 3);
        assert_eq!(index.get("qa_0").unwrap(), before);
    }

    #[tokio::test]
    async fn unrecovered_failure_aborts_the_run() {
        let index = Arc::new(MemoryIndex::new());
        let embedder = WordEmbedder {
            calls: AtomicUsize::new(0),
            fail_after: Some(1),
        };
        let ingestor = Ingestor::new(Arc::new(embedder), index.clone(), RetryPolicy::none(), &ingest_settings(2));
        let file = csv_file(FAQ);

        let err = ingestor.ingest_file(file.path()).await.unwrap_err();

        assert!(matches!(
            err,
            AssistantError::ExternalService {
                service: Service::Embedding,
                ..
            }
        ));
        // first batch landed before the failure
        assert_eq!(index.count().await.unwrap(), 2);
    }

    #[test]
    fn failed_batch_is_reported_apart_from_unsent_ones() {
        let records: Vec<FaqRecord> = (0..5)
            .map(|i| FaqRecord::new(FaqRecord::row_id(i), "q", "a"))
            .collect();

        let (uncertain, pending) = unconfirmed_ids(&records, 2, 2);

        assert_eq!(uncertain, vec!["qa_2", "qa_3"]);
        assert_eq!(pending, vec!["qa_4"]);
    }

    #[tokio::test]
    async fn missing_column_writes_nothing() {
        let index = Arc::new(MemoryIndex::new());
        let embedder = Arc::new(WordEmbedder::new());
        let ingestor = Ingestor::new(embedder.clone(), index.clone(), RetryPolicy::none(), &ingest_settings(2));
        let file = csv_file("Question,Reply\nHi,Hello\n");

        let err = ingestor.ingest_file(file.path()).await.unwrap_err();

        assert!(matches!(err, AssistantError::Validation(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
