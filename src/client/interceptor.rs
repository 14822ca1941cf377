//! Request and response interception.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use tracing::warn;

use super::context::RequestContext;

/// What the retry driver does with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseDisposition {
    /// Not an authorization failure; hand it to the caller.
    PassThrough,
    /// First authorization failure; refresh and replay once.
    Refresh,
    /// Authorization failure on the replay; hand it to the caller.
    AlreadyRetried,
}

/// Stamp `headers` with the access credential as a bearer token.
///
/// Without a credential the headers are returned unmodified.
pub fn attach_bearer(mut headers: HeaderMap, access_token: Option<&str>) -> HeaderMap {
    let Some(token) = access_token.filter(|t| !t.is_empty()) else {
        return headers;
    };
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Err(_) => warn!("stored access credential is not a valid header value; sending without it"),
    }
    headers
}

/// Decide whether a response should trigger a refresh.
pub fn classify_response(status: StatusCode, context: RequestContext) -> ResponseDisposition {
    if status != StatusCode::UNAUTHORIZED {
        return ResponseDisposition::PassThrough;
    }
    if context.is_retried() {
        ResponseDisposition::AlreadyRetried
    } else {
        ResponseDisposition::Refresh
    }
}
