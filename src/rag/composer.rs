use std::sync::Arc;

use super::prompt::{self, NOT_AVAILABLE_MESSAGE};
use super::retriever::ScoredFaq;
use crate::core::config::settings::GenerationSettings;
use crate::core::errors::{AssistantError, Service};
use crate::llm::{ChatMessage, GenerationRequest, Generator};

/// Turns a question plus retrieved FAQ entries into a grounded answer.
///
/// The generator is called at most once per question.
#[derive(Clone)]
pub struct ResponseComposer {
    generator: Arc<dyn Generator>,
    store_name: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl ResponseComposer {
    pub fn new(generator: Arc<dyn Generator>, store_name: impl Into<String>, settings: &GenerationSettings) -> Self {
        Self {
            generator,
            store_name: store_name.into(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        }
    }

    pub async fn compose(&self, question: &str, context: &[ScoredFaq]) -> Result<String, AssistantError> {
        if context.is_empty() {
            tracing::info!("No relevant FAQ entries; returning the not-available answer");
            return Ok(NOT_AVAILABLE_MESSAGE.to_string());
        }

        let request = GenerationRequest::new(vec![ChatMessage::user(prompt::user_message(question, context))])
            .with_system(prompt::system_instruction(&self.store_name))
            .with_sampling(self.temperature, self.max_output_tokens);

        tracing::debug!(
            "Composing answer with {} from {} FAQ entries",
            self.generator.name(),
            context.len()
        );
        let text = self.generator.generate(request).await?;

        let text = text.trim();
        if text.is_empty() {
            return Err(AssistantError::malformed(Service::Generation, "empty answer"));
        }
        Ok(text.to_string())
    }
}
