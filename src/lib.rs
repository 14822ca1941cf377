//! Tether: authenticated HTTP client with single-flight credential refresh.
//!
//! Requests are stamped with the stored access credential. When the server
//! answers 401, one refresh call is made no matter how many requests were
//! rejected concurrently; every rejected request is then replayed once with
//! the new credential. A failed refresh clears the stored credentials, ends
//! the session through a [`SessionListener`](auth::SessionListener), and fails
//! every waiting request with the same error.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tether::prelude::*;
//!
//! # async fn example() -> tether::error::Result<()> {
//! let config = TetherConfig::from_env()?;
//! let store: Arc<dyn CredentialStore> = Arc::new(config.credential_store());
//! let client = AuthenticatedClient::new(
//!     &config,
//!     store,
//!     Arc::new(|reason: &AuthError| eprintln!("signed out: {reason}")),
//! )?;
//! let ponds: serde_json::Value = client.get_json("/ponds").await?;
//! println!("{ponds}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
