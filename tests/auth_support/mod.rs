#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tether::auth::{AuthError, CredentialPair, MemoryCredentialStore, SessionListener};
use tether::client::AuthenticatedClient;
use tether::config::TetherConfig;
use wiremock::MockServer;

/// Session listener that records every termination signal.
#[derive(Default)]
pub struct RecordingListener {
    hits: AtomicUsize,
    reasons: Mutex<Vec<AuthError>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn reasons(&self) -> Vec<AuthError> {
        self.reasons.lock().expect("listener lock poisoned").clone()
    }
}

impl SessionListener for RecordingListener {
    fn session_terminated(&self, reason: &AuthError) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.reasons
            .lock()
            .expect("listener lock poisoned")
            .push(reason.clone());
    }
}

pub fn pair(access: &str, refresh: Option<&str>) -> CredentialPair {
    CredentialPair::new(access, refresh.map(String::from))
}

pub fn store_with(access: &str, refresh: Option<&str>) -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_pair(pair(access, refresh)))
}

pub fn config_for(server: &MockServer) -> TetherConfig {
    TetherConfig::new()
        .with_base_url(server.uri())
        .expect("mock server uri is a valid base url")
}

pub fn client_for(
    server: &MockServer,
    store: Arc<MemoryCredentialStore>,
    listener: Arc<RecordingListener>,
) -> AuthenticatedClient {
    AuthenticatedClient::new(&config_for(server), store, listener).expect("build client")
}

/// Number of requests the server received for `path`.
pub async fn requests_to(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .filter(|request| request.url.path() == path)
        .count()
}
