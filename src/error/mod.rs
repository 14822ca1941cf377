//! Error types for tether.

use strum::Display;
use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for client operations.
#[derive(Error, Debug)]
pub enum TetherError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(#[source] AuthError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    SessionTerminated,
    Network,
    Server,
    Api,
    Configuration,
    Serialization,
    Unknown,
}

impl TetherError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(err) if err.is_terminal() => ErrorCategory::SessionTerminated,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Network,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether the caller must re-authenticate before trying again.
    pub fn is_session_terminated(&self) -> bool {
        self.category() == ErrorCategory::SessionTerminated
    }

    /// Underlying auth failure, if any.
    pub fn auth_error(&self) -> Option<&AuthError> {
        match self {
            Self::Authentication(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AuthError> for TetherError {
    fn from(error: AuthError) -> Self {
        Self::Authentication(error)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TetherError>;
