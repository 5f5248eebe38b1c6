use crate::embedder::EmbedError;
use crate::ingest::ExtractError;
use crate::llm::LlmError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Uploaded body exceeded the configured size limit
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// Document text extraction error
    #[error(transparent)]
    Extraction(#[from] ExtractError),

    /// Embedding provider error
    #[error(transparent)]
    Embedding(#[from] EmbedError),

    /// Upstream chat completion error
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Extraction(_) => StatusCode::BAD_REQUEST,
            Error::Embedding(_) => StatusCode::BAD_GATEWAY,
            Error::Llm(LlmError::MissingApiKey) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Llm(_) => StatusCode::BAD_GATEWAY,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::PayloadTooLarge { message } => message.clone(),
            Error::Extraction(err) => format!("Could not process document: {err}"),
            Error::Embedding(_) => "Embedding provider request failed".to_string(),
            Error::Llm(LlmError::MissingApiKey) => {
                "No LLM API key configured. Provide one in the request, via the settings endpoint, or in the server configuration".to_string()
            }
            Error::Llm(_) => "Upstream language model request failed".to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Embedding(_) | Error::Llm(_) => {
                tracing::warn!("Upstream provider error: {:#}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::PayloadTooLarge { .. } | Error::Extraction(_) => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({ "detail": self.user_message() });

        (status, axum::response::Json(body)).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
