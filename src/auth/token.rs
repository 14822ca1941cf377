use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access and refresh credentials for one authenticated session.
///
/// # Example
/// ```
/// use tether::auth::CredentialPair;
///
/// let pair = CredentialPair::new("access", Some("refresh".to_string()));
/// assert!(pair.has_refresh());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            last_refresh: None,
        }
    }

    /// Whether a usable refresh credential is present.
    pub fn has_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }

    /// Replace the access credential after a refresh.
    ///
    /// A rotated refresh credential replaces the stored one; `None` keeps it.
    pub fn rotated(&self, access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token: refresh_token.or_else(|| self.refresh_token.clone()),
            last_refresh: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotated_keeps_refresh_when_not_rotated() {
        let pair = CredentialPair::new("A1", Some("R1".to_string()));
        let next = pair.rotated("A2".to_string(), None);
        assert_eq!(next.access_token, "A2");
        assert_eq!(next.refresh_token.as_deref(), Some("R1"));
        assert!(next.last_refresh.is_some());
    }

    #[test]
    fn rotated_persists_new_refresh_credential() {
        let pair = CredentialPair::new("A1", Some("R1".to_string()));
        let next = pair.rotated("A2".to_string(), Some("R2".to_string()));
        assert_eq!(next.refresh_token.as_deref(), Some("R2"));
    }

    #[test]
    fn blank_refresh_is_not_usable() {
        assert!(!CredentialPair::new("A1", Some("  ".to_string())).has_refresh());
        assert!(!CredentialPair::new("A1", None).has_refresh());
    }
}
