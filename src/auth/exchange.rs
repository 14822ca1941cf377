//! HTTP exchanges against the authentication endpoints.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::AuthError;
use super::token::CredentialPair;

pub const DEFAULT_TOKEN_PATH: &str = "/token";
pub const DEFAULT_REFRESH_PATH: &str = "/refresh";

/// Credentials returned by a successful refresh call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedCredential {
    pub access_token: String,
    /// Present only when the server rotates refresh credentials.
    pub refresh_token: Option<String>,
}

/// Performs the refresh network call on behalf of the coordinator.
#[async_trait]
pub trait Refresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedCredential, AuthError>;
}

/// Client for `POST /token` and `POST /refresh`.
///
/// # Example
/// ```no_run
/// use tether::auth::TokenEndpoint;
///
/// # async fn example() -> Result<(), tether::auth::AuthError> {
/// let endpoint = TokenEndpoint::new(reqwest::Client::new(), "http://localhost:8000");
/// let pair = endpoint.login("ada@example.com", "hunter2").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    client: reqwest::Client,
    base_url: String,
    token_path: String,
    refresh_path: String,
}

impl TokenEndpoint {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
        }
    }

    pub fn with_token_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Exchange primary credentials for an initial credential pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<CredentialPair, AuthError> {
        let resp = self
            .client
            .post(self.url(&self.token_path))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::InvalidResponse(format!(
                "Token request failed with status {status}: {}",
                extract_detail(&body)
            )));
        }
        let payload: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("Malformed token response: {e}")))?;
        if let Some(kind) = payload.token_type.as_deref() {
            if !kind.eq_ignore_ascii_case("bearer") {
                return Err(AuthError::InvalidResponse(format!(
                    "Unsupported token type: {kind}"
                )));
            }
        }
        let mut pair = CredentialPair::new(payload.access_token, payload.refresh_token);
        pair.last_refresh = Some(chrono::Utc::now());
        Ok(pair)
    }
}

#[async_trait]
impl Refresher for TokenEndpoint {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedCredential, AuthError> {
        debug!(path = %self.refresh_path, "requesting credential refresh");
        let resp = self
            .client
            .post(self.url(&self.refresh_path))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::RefreshRejected {
                status: status.as_u16(),
                message: extract_detail(&body),
            });
        }
        let payload: RefreshResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("Malformed refresh response: {e}")))?;
        if payload.access_token.trim().is_empty() {
            return Err(AuthError::InvalidResponse(
                "Refresh response carried an empty access_token".to_string(),
            ));
        }
        Ok(RefreshedCredential {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token.filter(|t| !t.trim().is_empty()),
        })
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Pull a readable message out of an error body (`{"detail": ...}` or raw text).
pub(crate) fn extract_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(
            join_url("http://localhost:8000/", "/refresh"),
            "http://localhost:8000/refresh"
        );
        assert_eq!(
            join_url("http://localhost:8000", "ponds"),
            "http://localhost:8000/ponds"
        );
        assert_eq!(
            join_url("http://localhost:8000", "https://other.example/x"),
            "https://other.example/x"
        );
    }

    #[test]
    fn extract_detail_reads_fastapi_errors() {
        assert_eq!(
            extract_detail(r#"{"detail":"Could not validate credentials"}"#),
            "Could not validate credentials"
        );
        assert_eq!(extract_detail("  plain failure \n"), "plain failure");
        assert_eq!(
            extract_detail(r#"{"detail":[{"msg":"field required"}]}"#),
            r#"[{"msg":"field required"}]"#
        );
    }
}
