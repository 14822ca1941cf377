use bon::Builder;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::auth::exchange::extract_detail;
use crate::error::{Result, TetherError};

/// Body of an [`ApiRequest`], kept in a form that can be replayed.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Text(String),
}

/// Replayable description of an outgoing request.
///
/// # Example
/// ```
/// use tether::client::{ApiRequest, RequestBody};
/// use reqwest::Method;
///
/// let request = ApiRequest::builder()
///     .method(Method::POST)
///     .path("/ponds")
///     .body(RequestBody::Json(serde_json::json!({ "name": "Savings" })))
///     .build();
/// assert_eq!(request.path, "/ponds");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ApiRequest {
    pub method: Method,
    #[builder(into)]
    pub path: String,
    #[builder(default)]
    pub query: Vec<(String, String)>,
    #[builder(default)]
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::builder().method(Method::GET).path(path).build()
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::builder().method(Method::DELETE).path(path).build()
    }

    pub fn post_json(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::builder()
            .method(Method::POST)
            .path(path)
            .body(RequestBody::Json(body))
            .build()
    }

    pub fn put_json(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::builder()
            .method(Method::PUT)
            .path(path)
            .body(RequestBody::Json(body))
            .build()
    }
}

/// Fully buffered response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub(crate) async fn from_reqwest(resp: reqwest::Response) -> Result<Self> {
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();
        Ok(Self::new(status, headers, body))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turn a non-2xx response into [`TetherError::Api`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            return Ok(self);
        }
        Err(TetherError::api(
            self.status.as_u16(),
            extract_detail(&self.text()),
        ))
    }
}
