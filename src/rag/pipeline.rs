use std::sync::Arc;

use serde::Serialize;

use super::composer::ResponseComposer;
use super::retriever::{Retriever, ScoredFaq};
use crate::core::config::AppConfig;
use crate::core::errors::AssistantError;
use crate::core::retry::RetryPolicy;
use crate::embedding::{Embedder, QueryEmbedder};
use crate::index::VectorIndex;
use crate::llm::Generator;

/// Result of answering one question.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<ScoredFaq>,
}

/// Progress points reported while a question is being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Embedding the question and querying the index.
    FetchingContext,
    /// Context retrieved; the answer is being generated.
    SynthesizingContext,
}

/// Question in, grounded answer out: embed, retrieve, compose.
#[derive(Clone)]
pub struct FaqAssistant {
    embedder: QueryEmbedder,
    retriever: Retriever,
    composer: ResponseComposer,
}

impl FaqAssistant {
    pub fn new(embedder: QueryEmbedder, retriever: Retriever, composer: ResponseComposer) -> Self {
        Self {
            embedder,
            retriever,
            composer,
        }
    }

    /// Wires the pipeline from configuration and the three providers.
    pub fn from_config(
        config: &AppConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let settings = &config.settings;
        let retry = RetryPolicy::from(&settings.retry);
        Self::new(
            QueryEmbedder::new(embedder, retry.clone(), settings.app.max_question_chars),
            Retriever::new(index, retry, &settings.retrieval),
            ResponseComposer::new(generator, settings.app.store_name.clone(), &settings.generation),
        )
    }

    pub async fn ask(&self, question: &str) -> Result<Answer, AssistantError> {
        self.ask_with_progress(question, |_| {}).await
    }

    /// `ask`, calling `on_stage` as each step starts. Rejected input reports no stage.
    pub async fn ask_with_progress<F>(&self, question: &str, on_stage: F) -> Result<Answer, AssistantError>
    where
        F: Fn(Stage),
    {
        let question = self.embedder.validate(question)?;

        on_stage(Stage::FetchingContext);
        let vector = self.embedder.embed_query(question).await?;
        let sources = self
            .retriever
            .retrieve(&vector, self.retriever.top_k())
            .await?;
        tracing::debug!("Retrieved {} FAQ entries for the question", sources.len());

        on_stage(Stage::SynthesizingContext);
        let text = self.composer.compose(question, &sources).await?;
        Ok(Answer { text, sources })
    }

    /// Like `ask`, but always yields something to show the user.
    pub async fn answer(&self, question: &str) -> String {
        self.answer_with_progress(question, |_| {}).await
    }

    pub async fn answer_with_progress<F>(&self, question: &str, on_stage: F) -> String
    where
        F: Fn(Stage),
    {
        match self.ask_with_progress(question, on_stage).await {
            Ok(answer) => answer.text,
            Err(err) => {
                match &err {
                    AssistantError::Input(_) | AssistantError::Validation(_) => {
                        tracing::info!("Rejected question: {}", err)
                    }
                    _ => tracing::error!("Failed to answer question: {}", err),
                }
                err.user_message().to_string()
            }
        }
    }
}
