//! Configuration system (layered: code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::exchange::{DEFAULT_REFRESH_PATH, DEFAULT_TOKEN_PATH};
use crate::auth::{CredentialStoreConfig, FileCredentialStore, TokenEndpoint};
use crate::error::{Result, TetherError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PROFILE: &str = "default";

/// Client configuration.
///
/// Environment variables:
/// - `TETHER_API_URL`: API base URL
/// - `TETHER_TOKEN_PATH`, `TETHER_REFRESH_PATH`: auth endpoint paths
/// - `TETHER_TIMEOUT_SECS`: transport timeout, also the only bound on refresh
/// - `TETHER_HOME`: credential directory
/// - `TETHER_PROFILE`: credential profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TetherConfig {
    base_url: String,
    token_path: String,
    refresh_path: String,
    timeout: Duration,
    credential_dir: PathBuf,
    profile: String,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TetherConfig {
    /// Defaults only; no environment lookup.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credential_dir: CredentialStoreConfig::default_dir(),
            profile: DEFAULT_PROFILE.to_string(),
        }
    }

    /// Load from the process environment, reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::new();

        if let Some(url) = get("TETHER_API_URL") {
            config = config.with_base_url(url)?;
        }
        if let Some(path) = get("TETHER_TOKEN_PATH") {
            config.token_path = path;
        }
        if let Some(path) = get("TETHER_REFRESH_PATH") {
            config.refresh_path = path;
        }
        if let Some(raw) = get("TETHER_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                TetherError::Configuration(format!(
                    "TETHER_TIMEOUT_SECS must be an integer, got {raw}"
                ))
            })?;
            config = config.with_timeout(Duration::from_secs(secs))?;
        }
        if let Some(dir) = get("TETHER_HOME") {
            config.credential_dir = PathBuf::from(dir);
        }
        if let Some(profile) = get("TETHER_PROFILE") {
            config.profile = profile;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| TetherError::Configuration(format!("invalid API URL {url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TetherError::Configuration(format!(
                "API URL must be http or https, got {url}"
            )));
        }
        self.base_url = url;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(TetherError::Configuration(
                "timeout must be greater than zero".to_string(),
            ));
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn with_auth_paths(
        mut self,
        token_path: impl Into<String>,
        refresh_path: impl Into<String>,
    ) -> Self {
        self.token_path = token_path.into();
        self.refresh_path = refresh_path.into();
        self
    }

    pub fn with_credential_dir(mut self, dir: PathBuf) -> Self {
        self.credential_dir = dir;
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_path(&self) -> &str {
        &self.token_path
    }

    pub fn refresh_path(&self) -> &str {
        &self.refresh_path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn credential_dir(&self) -> &PathBuf {
        &self.credential_dir
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Build the transport shared by API calls and auth exchanges.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| TetherError::Configuration(format!("failed to build HTTP client: {e}")))
    }

    pub fn token_endpoint(&self, http: reqwest::Client) -> TokenEndpoint {
        TokenEndpoint::new(http, self.base_url.clone())
            .with_token_path(self.token_path.clone())
            .with_refresh_path(self.refresh_path.clone())
    }

    pub fn credential_store(&self) -> FileCredentialStore {
        FileCredentialStore::new(
            CredentialStoreConfig::new(self.credential_dir.clone())
                .with_profile(self.profile.clone()),
        )
    }
}
