//! Shared reqwest plumbing for the provider clients.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::core::errors::{AssistantError, FailureKind, Service};

const MAX_ERROR_BODY_CHARS: usize = 300;

pub fn build_client(timeout: Duration) -> Result<Client, AssistantError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("faq-assistant/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| AssistantError::Config(format!("Failed to build HTTP client: {}", err)))
}

/// Turns a non-2xx response into an `ExternalService` error.
pub async fn ensure_success(service: Service, response: Response) -> Result<Response, AssistantError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    Err(AssistantError::external(
        service,
        FailureKind::from_status(status.as_u16()),
        format!("{}: {}", status, snippet.trim()),
    ))
}
