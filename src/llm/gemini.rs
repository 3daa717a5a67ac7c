use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::provider::Generator;
use super::types::GenerationRequest;
use crate::core::config::settings::GenerationSettings;
use crate::core::config::Secret;
use crate::core::errors::{AssistantError, Service};
use crate::core::http::{build_client, ensure_success};

/// Google Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiGenerator {
    base_url: String,
    model: String,
    api_key: Secret,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiGenerator {
    pub fn new(
        settings: &GenerationSettings,
        api_key: Secret,
        timeout: std::time::Duration,
    ) -> Result<Self, AssistantError> {
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
            client: build_client(timeout)?,
        })
    }

    fn build_body(request: GenerationRequest) -> GenerateContentRequest {
        let system_instruction = request.system.map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        });

        let contents = request
            .messages
            .into_iter()
            .map(|message| Content {
                role: Some(match message.role.as_str() {
                    "assistant" | "model" => "model".to_string(),
                    _ => "user".to_string(),
                }),
                parts: vec![Part {
                    text: message.content,
                }],
            })
            .collect();

        let generation_config = if request.temperature.is_some() || request.max_output_tokens.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            })
        } else {
            None
        };

        GenerateContentRequest {
            system_instruction,
            contents,
            generation_config,
        }
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, AssistantError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = Self::build_body(request);

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|err| AssistantError::from_transport(Service::Generation, err))?;
        let res = ensure_success(Service::Generation, res).await?;

        let payload: GenerateContentResponse = res
            .json()
            .await
            .map_err(|err| AssistantError::malformed(Service::Generation, err.to_string()))?;

        let Some(candidate) = payload.candidates.into_iter().next() else {
            let reason = payload
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(AssistantError::malformed(
                Service::Generation,
                format!("no answer generated: {}", reason),
            ));
        };

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect();
        if text.trim().is_empty() {
            return Err(AssistantError::malformed(
                Service::Generation,
                format!(
                    "empty answer (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            ));
        }

        Ok(text)
    }
}
