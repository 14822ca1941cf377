use thiserror::Error;

/// Errors raised by credential storage, token exchange and refresh.
///
/// Cloneable so one refresh failure can settle every waiting caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("No refresh credential stored")]
    RefreshUnavailable,
    #[error("Refresh rejected (status {status}): {message}")]
    RefreshRejected { status: u16, message: String },
    #[error("Refresh abandoned before it settled")]
    RefreshAbandoned,
    #[error("Incorrect username or password")]
    InvalidCredentials,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Whether this error ends the session when it comes out of a refresh.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RefreshUnavailable
                | Self::RefreshRejected { .. }
                | Self::RefreshAbandoned
                | Self::InvalidResponse(_)
                | Self::Network(_)
        )
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
