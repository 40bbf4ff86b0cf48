//! Error taxonomy for calls to the expression service.

use thiserror::Error;

use crate::session::SessionError;

/// Failure of a single gateway call.
///
/// The gateway never retries and never hides a failure: the service's
/// error message is carried verbatim so views can show it as-is.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The service rejected the request (malformed expression, duplicate
    /// registration, bad credentials).
    #[error("{message}")]
    Validation { status: u16, message: String },

    /// Missing or expired bearer token (401/403).
    #[error("{message}")]
    Auth { status: u16, message: String },

    /// The service failed while handling the request (5xx).
    #[error("{message}")]
    Server { status: u16, message: String },

    /// No response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// A 2xx response whose body does not match the contract.
    #[error("unexpected response from service: {0}")]
    Decode(String),

    /// The call succeeded but persisting session state failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Classify a non-2xx response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Auth { status, message },
            400..=499 => Self::Validation { status, message },
            _ => Self::Server { status, message },
        }
    }

    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Validation { status, .. }
            | Self::Auth { status, .. }
            | Self::Server { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) | Self::Session(_) => None,
        }
    }

    /// Message suitable for a user-facing notification.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message, .. }
            | Self::Auth { message, .. }
            | Self::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Result alias for gateway calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
