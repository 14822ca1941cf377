//! Convenience re-exports for common use.

pub use crate::auth::{
    AuthError, AuthService, CredentialPair, CredentialStore, FileCredentialStore,
    MemoryCredentialStore, RefreshCoordinator, SessionListener,
};
pub use crate::client::{ApiRequest, ApiResponse, AuthenticatedClient, RequestBody};
pub use crate::config::TetherConfig;
pub use crate::error::{Result, TetherError};
