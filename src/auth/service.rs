use std::sync::Arc;

use tracing::info;

use super::error::AuthError;
use super::exchange::TokenEndpoint;
use super::store::CredentialStore;
use super::token::CredentialPair;

/// Login, logout and status over a credential store.
///
/// All I/O decisions (printing, prompting, exit codes) belong to the caller.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use tether::auth::{AuthService, MemoryCredentialStore, TokenEndpoint};
///
/// # async fn example() -> Result<(), tether::auth::AuthError> {
/// let endpoint = TokenEndpoint::new(reqwest::Client::new(), "http://localhost:8000");
/// let svc = AuthService::new(endpoint, Arc::new(MemoryCredentialStore::new()));
/// svc.login("ada@example.com", "hunter2").await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthService {
    endpoint: TokenEndpoint,
    store: Arc<dyn CredentialStore>,
}

impl AuthService {
    pub fn new(endpoint: TokenEndpoint, store: Arc<dyn CredentialStore>) -> Self {
        Self { endpoint, store }
    }

    /// Exchange primary credentials for a pair and persist it.
    pub async fn login(&self, username: &str, password: &str) -> Result<CredentialPair, AuthError> {
        let pair = self.endpoint.login(username, password).await?;
        self.store.save(&pair)?;
        info!(refreshable = pair.has_refresh(), "logged in");
        Ok(pair)
    }

    /// Stored pair, or `None` when not logged in.
    pub fn status(&self) -> Result<Option<CredentialPair>, AuthError> {
        self.store.load()
    }

    /// Stored pair, or [`AuthError::NotLoggedIn`].
    pub fn require_session(&self) -> Result<CredentialPair, AuthError> {
        self.store.load()?.ok_or(AuthError::NotLoggedIn)
    }

    /// Remove stored credentials. Succeeds when already logged out.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryCredentialStore;

    fn service(store: Arc<MemoryCredentialStore>) -> AuthService {
        let endpoint = TokenEndpoint::new(reqwest::Client::new(), "http://127.0.0.1:9");
        AuthService::new(endpoint, store)
    }

    #[test]
    fn status_is_none_when_logged_out() {
        let svc = service(Arc::new(MemoryCredentialStore::new()));
        assert!(svc.status().unwrap().is_none());
        assert_eq!(svc.require_session().unwrap_err(), AuthError::NotLoggedIn);
    }

    #[test]
    fn logout_clears_and_is_idempotent() {
        let store = Arc::new(MemoryCredentialStore::with_pair(CredentialPair::new(
            "A1", None,
        )));
        let svc = service(store.clone());
        svc.logout().unwrap();
        svc.logout().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
