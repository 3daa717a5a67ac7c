use async_trait::async_trait;

use super::types::GenerationRequest;
use crate::core::errors::AssistantError;

#[async_trait]
pub trait Generator: Send + Sync {
    /// Provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Single completion, returned as plain text.
    async fn generate(&self, request: GenerationRequest) -> Result<String, AssistantError>;
}
