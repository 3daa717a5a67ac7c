use std::fmt;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Shown to users whenever an upstream provider fails.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I couldn't process your request at this time. Please try again later.";

/// Shown to users when they submit an empty or unusable question.
pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question so I can help you.";

/// The external collaborator a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Embedding,
    VectorIndex,
    Generation,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Embedding => "embedding",
            Service::VectorIndex => "vector-index",
            Service::Generation => "generation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Timeout,
    Unauthorized,
    RateLimited,
    Status(u16),
    MalformedResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => f.write_str("network error"),
            FailureKind::Timeout => f.write_str("timed out"),
            FailureKind::Unauthorized => f.write_str("unauthorized"),
            FailureKind::RateLimited => f.write_str("rate limited"),
            FailureKind::Status(code) => write!(f, "HTTP {}", code),
            FailureKind::MalformedResponse => f.write_str("malformed response"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("invalid input: {0}")]
    Input(String),
    #[error("{service} service failed ({kind}): {message}")]
    ExternalService {
        service: Service,
        kind: FailureKind,
        message: String,
    },
}

impl AssistantError {
    pub fn external(service: Service, kind: FailureKind, message: impl Into<String>) -> Self {
        AssistantError::ExternalService {
            service,
            kind,
            message: message.into(),
        }
    }

    pub fn malformed(service: Service, message: impl Into<String>) -> Self {
        Self::external(service, FailureKind::MalformedResponse, message)
    }

    /// Maps a transport-level reqwest failure onto the taxonomy.
    pub fn from_transport(service: Service, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_decode() {
            FailureKind::MalformedResponse
        } else if let Some(status) = err.status() {
            FailureKind::from_status(status.as_u16())
        } else {
            FailureKind::Network
        };
        Self::external(service, kind, err.to_string())
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AssistantError::ExternalService { kind, .. } => kind.is_retryable(),
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            AssistantError::ExternalService {
                kind: FailureKind::Timeout,
                ..
            }
        )
    }

    /// Message safe to show an end user; never carries provider detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            AssistantError::Input(_) | AssistantError::Validation(_) => EMPTY_QUESTION_MESSAGE,
            _ => APOLOGY_MESSAGE,
        }
    }
}

impl FailureKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => FailureKind::Unauthorized,
            408 => FailureKind::Timeout,
            429 => FailureKind::RateLimited,
            other => FailureKind::Status(other),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            FailureKind::Network | FailureKind::Timeout | FailureKind::RateLimited => true,
            FailureKind::Status(code) => *code >= 500,
            FailureKind::Unauthorized | FailureKind::MalformedResponse => false,
        }
    }
}

/// Error surface of the HTTP server.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("upstream failure: {0}")]
    BadGateway(String),
    #[error("upstream timeout: {0}")]
    GatewayTimeout(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match &err {
            AssistantError::Input(msg) | AssistantError::Validation(msg) => {
                ApiError::BadRequest(msg.clone())
            }
            AssistantError::ExternalService { service, .. } if err.is_timeout() => {
                ApiError::GatewayTimeout(service.to_string())
            }
            AssistantError::ExternalService { service, .. } => {
                ApiError::BadGateway(service.to_string())
            }
            AssistantError::Config(msg) => ApiError::Internal(msg.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, answer, error) = match &self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, EMPTY_QUESTION_MESSAGE, msg.clone())
            }
            ApiError::BadGateway(service) => (
                StatusCode::BAD_GATEWAY,
                APOLOGY_MESSAGE,
                format!("{} service unavailable", service),
            ),
            ApiError::GatewayTimeout(service) => (
                StatusCode::GATEWAY_TIMEOUT,
                APOLOGY_MESSAGE,
                format!("{} service timed out", service),
            ),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                APOLOGY_MESSAGE,
                "internal error".to_string(),
            ),
        };

        let body = Json(json!({ "answer": answer, "error": error }));
        (status, body).into_response()
    }
}
