//! Credential storage, token exchange and single-flight refresh.

pub mod coordinator;
pub mod error;
pub mod exchange;
pub mod service;
pub mod session;
pub mod store;
pub mod token;

pub use coordinator::RefreshCoordinator;
pub use error::AuthError;
pub use exchange::{RefreshedCredential, Refresher, TokenEndpoint};
pub use service::AuthService;
pub use session::{ChannelSessionListener, NoopSessionListener, SessionListener};
pub use store::{
    CredentialStore, CredentialStoreConfig, FileCredentialStore, MemoryCredentialStore,
};
pub use token::CredentialPair;
