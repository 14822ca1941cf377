//! Authenticated HTTP client with transparent credential refresh.
//!
//! Every request is stamped with the stored access credential. A 401 on the
//! first attempt hands off to the [`RefreshCoordinator`]; the request is then
//! replayed once with the credential it returns. A 401 on the replay goes back
//! to the caller as-is.

pub mod context;
pub mod interceptor;
pub mod request;

pub use context::RequestContext;
pub use interceptor::{attach_bearer, classify_response, ResponseDisposition};
pub use request::{ApiRequest, ApiResponse, RequestBody};

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::auth::exchange::join_url;
use crate::auth::{CredentialStore, RefreshCoordinator, SessionListener};
use crate::config::TetherConfig;
use crate::error::Result;

/// HTTP client that keeps a bearer session alive across concurrent calls.
///
/// Cheap to clone; clones share the store and the refresh coordinator.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use tether::auth::NoopSessionListener;
/// use tether::client::AuthenticatedClient;
/// use tether::config::TetherConfig;
///
/// # async fn example() -> tether::error::Result<()> {
/// let config = TetherConfig::from_env()?;
/// let store = Arc::new(config.credential_store());
/// let client = AuthenticatedClient::new(&config, store, Arc::new(NoopSessionListener))?;
/// let ponds: serde_json::Value = client.get_json("/ponds").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthenticatedClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("base_url", &self.base_url)
            .field("store", &"..")
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

impl AuthenticatedClient {
    pub fn new(
        config: &TetherConfig,
        store: Arc<dyn CredentialStore>,
        listener: Arc<dyn SessionListener>,
    ) -> Result<Self> {
        let http = config.http_client()?;
        let endpoint = config.token_endpoint(http.clone());
        let coordinator = Arc::new(RefreshCoordinator::new(
            store.clone(),
            Arc::new(endpoint),
            listener,
        ));
        Ok(Self::from_parts(
            http,
            config.base_url().to_string(),
            store,
            coordinator,
        ))
    }

    pub fn from_parts(
        http: reqwest::Client,
        base_url: String,
        store: Arc<dyn CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            http,
            base_url,
            store,
            coordinator,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Send a request, refreshing and replaying it once on a 401.
    ///
    /// Any response that is not handled by the refresh path is returned as-is,
    /// including non-2xx statuses. Terminal refresh failures come back as
    /// [`TetherError::Authentication`](crate::error::TetherError::Authentication).
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut context = RequestContext::new();
        let mut credential = self.store.access_token()?;
        loop {
            let response = self
                .dispatch(request, credential.as_deref(), context)
                .await?;
            match classify_response(response.status(), context) {
                ResponseDisposition::PassThrough => return Ok(response),
                ResponseDisposition::AlreadyRetried => {
                    debug!(
                        method = %request.method,
                        path = %request.path,
                        "authorization failed after refresh; not retrying again"
                    );
                    return Ok(response);
                }
                ResponseDisposition::Refresh => {
                    let fresh = self
                        .coordinator
                        .credential_after_rejection(credential.as_deref())
                        .await?;
                    credential = Some(fresh);
                    context = context.into_retried();
                }
            }
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        credential: Option<&str>,
        context: RequestContext,
    ) -> Result<ApiResponse> {
        debug!(
            method = %request.method,
            path = %request.path,
            retried = context.is_retried(),
            authenticated = credential.is_some(),
            "dispatching request"
        );
        let url = join_url(&self.base_url, &request.path);
        let headers = attach_bearer(request.headers.clone(), credential);
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Form(fields)) => builder.form(fields),
            Some(RequestBody::Text(text)) => builder.body(text.clone()),
            None => builder,
        };
        let resp = builder.send().await?;
        ApiResponse::from_reqwest(resp).await
    }

    /// GET `path` and decode a successful JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(&ApiRequest::get(path))
            .await?
            .error_for_status()?
            .json()
    }

    /// POST a JSON body to `path` and decode a successful JSON response.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.send(&ApiRequest::post_json(path, body))
            .await?
            .error_for_status()?
            .json()
    }

    /// PUT a JSON body to `path` and decode a successful JSON response.
    pub async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.send(&ApiRequest::put_json(path, body))
            .await?
            .error_for_status()?
            .json()
    }

    /// DELETE `path`, failing on a non-2xx status.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(&ApiRequest::delete(path)).await?.error_for_status()
    }
}
