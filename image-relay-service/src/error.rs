//! Failure taxonomy for the relay and its mapping onto HTTP responses.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorBody;

/// Message sent when the upstream failed without a usable `error.message`.
pub const UPSTREAM_FALLBACK_MESSAGE: &str = "Failed to reach the image generation API";

/// Message sent for any internal failure; the cause is only logged.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Coarse classification used for status lookup, logs and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientMethod,
    RequestBody,
    Configuration,
    Validation,
    Upstream,
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ClientMethod => "client_method",
            ErrorKind::RequestBody => "request_body",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Validation => "validation",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Transport => "transport",
        }
    }

    /// Whether the failure originates inside this service rather than with
    /// the caller or the upstream.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ErrorKind::Configuration | ErrorKind::Validation | ErrorKind::Transport
        )
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The inbound body could not be read, e.g. it exceeds the size limit.
    #[error("Request body rejected ({status}): {message}")]
    RequestBody { status: StatusCode, message: String },

    #[error("Upstream credential is not configured")]
    Configuration,

    #[error("{0}")]
    Validation(String),

    #[error("Upstream returned {status}: {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Transport error: {0:#}")]
    Transport(anyhow::Error),
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::MethodNotAllowed => ErrorKind::ClientMethod,
            RelayError::RequestBody { .. } => ErrorKind::RequestBody,
            RelayError::Configuration => ErrorKind::Configuration,
            RelayError::Validation(_) => ErrorKind::Validation,
            RelayError::Upstream { .. } => ErrorKind::Upstream,
            RelayError::Transport(_) => ErrorKind::Transport,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::RequestBody { status, .. } | RelayError::Upstream { status, .. } => *status,
            RelayError::Configuration | RelayError::Validation(_) | RelayError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text placed in the `error` field of the response body.
    pub fn public_message(&self) -> String {
        match self {
            RelayError::MethodNotAllowed => "Method not allowed".to_string(),
            RelayError::Configuration => "Server configuration error".to_string(),
            RelayError::RequestBody { message, .. } => message.clone(),
            RelayError::Validation(message) => message.clone(),
            RelayError::Upstream { message, .. } => message.clone(),
            RelayError::Transport(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<BytesRejection> for RelayError {
    fn from(rejection: BytesRejection) -> Self {
        RelayError::RequestBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}
