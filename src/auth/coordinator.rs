//! Single-flight credential refresh.
//!
//! [`RefreshCoordinator`] owns the `refreshing` flag and the queue of callers
//! waiting on the in-flight refresh. Both live behind one mutex, so checking
//! the flag, claiming the refresh and enqueueing a waiter are atomic with
//! respect to each other. Draining settles every queued waiter inside the same
//! critical section that clears the flag.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::error::AuthError;
use super::exchange::Refresher;
use super::session::SessionListener;
use super::store::CredentialStore;

type Settlement = Result<String, AuthError>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    pending: Vec<oneshot::Sender<Settlement>>,
    /// Bumped every time a refresh cycle settles.
    generation: u64,
    last_failure: Option<FailedCycle>,
}

/// A terminal refresh failure and the access credential it invalidated.
struct FailedCycle {
    access_token: String,
    error: AuthError,
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<Settlement>),
    Settled(String),
    Failed(AuthError),
}

/// Single-flight controller for the refresh network call.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use tether::auth::{
///     MemoryCredentialStore, NoopSessionListener, RefreshCoordinator, TokenEndpoint,
/// };
///
/// # async fn example() -> Result<(), tether::auth::AuthError> {
/// let endpoint = TokenEndpoint::new(reqwest::Client::new(), "http://localhost:8000");
/// let coordinator = RefreshCoordinator::new(
///     Arc::new(MemoryCredentialStore::new()),
///     Arc::new(endpoint),
///     Arc::new(NoopSessionListener),
/// );
/// let access = coordinator.obtain_fresh_credential().await?;
/// # Ok(())
/// # }
/// ```
pub struct RefreshCoordinator {
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn Refresher>,
    listener: Arc<dyn SessionListener>,
    state: Mutex<RefreshState>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &state.refreshing)
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn Refresher>,
        listener: Arc<dyn SessionListener>,
    ) -> Self {
        Self {
            store,
            refresher,
            listener,
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// Whether a refresh call is currently outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.lock_state().refreshing
    }

    /// Number of callers suspended on the in-flight refresh.
    pub fn pending_count(&self) -> usize {
        self.lock_state().pending.len()
    }

    /// Obtain a usable access credential, refreshing at most once across all
    /// concurrent callers.
    ///
    /// If a refresh is already in flight the caller waits for its outcome.
    /// Terminal failures clear the store and fire the session listener once,
    /// from the caller that performed the refresh.
    pub async fn obtain_fresh_credential(&self) -> Result<String, AuthError> {
        self.run(None).await
    }

    /// Like [`obtain_fresh_credential`](Self::obtain_fresh_credential), for a
    /// request that was rejected while carrying `rejected`.
    ///
    /// When the store already holds a different access credential, a refresh
    /// has settled since that request was sent and its credential is returned
    /// without another network call. When `rejected` is the credential a
    /// terminal refresh failure already invalidated, that failure is returned
    /// and the session listener is not called again.
    pub async fn credential_after_rejection(
        &self,
        rejected: Option<&str>,
    ) -> Result<String, AuthError> {
        self.run(Some(rejected)).await
    }

    async fn run(&self, rejected: Option<Option<&str>>) -> Result<String, AuthError> {
        match self.claim(rejected) {
            Role::Settled(access) => Ok(access),
            Role::Failed(err) => Err(err),
            Role::Waiter(rx) => {
                debug!("waiting on in-flight credential refresh");
                rx.await.unwrap_or(Err(AuthError::RefreshAbandoned))
            }
            Role::Leader => {
                let mut guard = LeaderGuard {
                    coordinator: self,
                    armed: true,
                };
                let (invalidated, outcome) = self.perform_refresh().await;
                guard.armed = false;
                self.settle(invalidated, outcome)
            }
        }
    }

    fn claim(&self, rejected: Option<Option<&str>>) -> Role {
        loop {
            let observed = self.lock_state().generation;
            // Store read errors fall through to a real refresh, which reports them.
            let current = match rejected {
                Some(_) => self.store.access_token().ok().flatten(),
                None => None,
            };

            let mut state = self.lock_state();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.pending.push(tx);
                return Role::Waiter(rx);
            }
            if state.generation != observed {
                // A cycle settled while the store was being read.
                continue;
            }
            if let Some(rejected) = rejected {
                if let Some(current) = current.filter(|c| Some(c.as_str()) != rejected) {
                    debug!("access credential already replaced; skipping refresh");
                    return Role::Settled(current);
                }
                if let Some(failed) = &state.last_failure {
                    if rejected == Some(failed.access_token.as_str()) {
                        debug!("access credential already invalidated; skipping refresh");
                        return Role::Failed(failed.error.clone());
                    }
                }
            }
            state.refreshing = true;
            return Role::Leader;
        }
    }

    /// Returns the access credential the attempt replaces, if one was stored.
    async fn perform_refresh(&self) -> (Option<String>, Settlement) {
        let pair = match self.store.load() {
            Ok(Some(pair)) => pair,
            Ok(None) => return (None, Err(AuthError::RefreshUnavailable)),
            Err(err) => return (None, Err(err)),
        };
        let invalidated = Some(pair.access_token.clone());
        if !pair.has_refresh() {
            return (invalidated, Err(AuthError::RefreshUnavailable));
        }
        let refresh_token = pair.refresh_token.clone().unwrap_or_default();

        let outcome = match self.refresher.refresh(&refresh_token).await {
            Ok(refreshed) => {
                let next = pair.rotated(refreshed.access_token, refreshed.refresh_token);
                self.store.save(&next).map(|()| next.access_token)
            }
            Err(err) => Err(err),
        };
        (invalidated, outcome)
    }

    fn settle(&self, invalidated: Option<String>, outcome: Settlement) -> Settlement {
        let terminal = matches!(&outcome, Err(err) if err.is_terminal());
        if terminal {
            if let Err(err) = self.store.clear() {
                warn!(error = %err, "failed to clear credentials after terminal refresh failure");
            }
        }

        let failed = match &outcome {
            Err(err) if terminal => invalidated.map(|access_token| FailedCycle {
                access_token,
                error: err.clone(),
            }),
            _ => None,
        };
        let waiters = self.drain(&outcome, failed);
        match &outcome {
            Ok(_) => info!(waiters, "credential refreshed"),
            Err(err) if terminal => {
                warn!(waiters, error = %err, "credential refresh failed; ending session");
                self.listener.session_terminated(err);
            }
            Err(err) => warn!(waiters, error = %err, "credential refresh failed"),
        }
        outcome
    }

    /// Clear the flag and settle every queued waiter in one critical section.
    fn drain(&self, outcome: &Settlement, failed: Option<FailedCycle>) -> usize {
        let mut state = self.lock_state();
        state.refreshing = false;
        state.generation = state.generation.wrapping_add(1);
        if outcome.is_ok() {
            state.last_failure = None;
        } else if failed.is_some() {
            state.last_failure = failed;
        }
        let pending = std::mem::take(&mut state.pending);
        let count = pending.len();
        for tx in pending {
            // A waiter that went away no longer needs the result.
            let _ = tx.send(outcome.clone());
        }
        count
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the refresh claim if the leading caller is dropped mid-refresh.
struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    armed: bool,
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let waiters = self.coordinator.drain(&Err(AuthError::RefreshAbandoned), None);
            warn!(waiters, "credential refresh abandoned by its caller");
        }
    }
}
