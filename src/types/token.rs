//! OAuth token snapshot and its persisted form

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

use crate::error::{AuthError, Result};
use crate::utils::unix_seconds;

/// Lifetime assumed when the provider omits `expires_in`
pub const DEFAULT_EXPIRES_IN: u64 = 3600;

fn default_token_type() -> String {
    "bearer".to_string()
}

/// An issued OAuth token.
///
/// Tokens are immutable values: a token always carries a non-empty access
/// token and an absolute expiry. Refreshing produces a new `OAuthToken`
/// that replaces the old one as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TokenRecord", into = "TokenRecord")]
pub struct OAuthToken {
    access_token: String,
    refresh_token: Option<String>,
    token_type: String,
    expires_in: u64,
    expires_at: u64,
    scope: Option<String>,
}

impl OAuthToken {
    /// Create a token issued at `issued_at` that lives for `expires_in` seconds
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Authorization` if `access_token` is empty.
    pub fn issue(
        access_token: impl Into<String>,
        expires_in: u64,
        issued_at: SystemTime,
    ) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(AuthError::authorization("response has no access_token"));
        }

        Ok(Self {
            access_token,
            refresh_token: None,
            token_type: default_token_type(),
            expires_in,
            expires_at: unix_seconds(issued_at).saturating_add(expires_in),
            scope: None,
        })
    }

    /// Same token with the given refresh token; empty values are dropped
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token.filter(|t| !t.is_empty());
        self
    }

    /// Same token with the given token type; empty values keep the default
    #[must_use]
    pub fn with_token_type(mut self, token_type: Option<String>) -> Self {
        if let Some(token_type) = token_type.filter(|t| !t.is_empty()) {
            self.token_type = token_type;
        }
        self
    }

    /// Same token with the given granted scope
    #[must_use]
    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope.filter(|s| !s.is_empty());
        self
    }

    /// Bearer credential for API calls
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Credential for obtaining a new access token, if the provider issued one
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Token type as reported by the provider
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Lifetime in seconds reported at issue time
    #[must_use]
    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    /// Unix timestamp (seconds) at which the token expires
    #[must_use]
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Scopes granted to this token
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Whether the token is expired at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        unix_seconds(now) >= self.expires_at
    }

    /// Whether the token is expired at `now`, treating the last `skew` of
    /// its lifetime as already expired
    #[must_use]
    pub fn expires_within(&self, now: SystemTime, skew: Duration) -> bool {
        unix_seconds(now).saturating_add(skew.as_secs()) >= self.expires_at
    }

    /// Whether the token is expired now
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }

    /// Remaining validity, or `None` once expired
    #[must_use]
    pub fn remaining_validity(&self) -> Option<Duration> {
        let now = unix_seconds(SystemTime::now());
        (self.expires_at > now).then(|| Duration::from_secs(self.expires_at - now))
    }

    /// `Authorization` header value
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("bearer {}", self.access_token)
    }
}

/// Persisted form of [`OAuthToken`].
///
/// Field names match the provider's token response so that host config
/// stores can keep the record verbatim. `expires_at` is absolute and is the
/// value expiry is derived from after a restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Access token
    pub access_token: String,
    /// Refresh token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token type
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds reported at issue time
    #[serde(default)]
    pub expires_in: u64,
    /// Unix timestamp (seconds) at which the token expires
    pub expires_at: u64,
    /// Granted scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TryFrom<TokenRecord> for OAuthToken {
    type Error = AuthError;

    fn try_from(record: TokenRecord) -> Result<Self> {
        if record.access_token.trim().is_empty() {
            return Err(AuthError::configuration(
                "stored token has an empty access_token",
            ));
        }

        Ok(Self {
            access_token: record.access_token,
            refresh_token: record.refresh_token.filter(|t| !t.is_empty()),
            token_type: record.token_type,
            expires_in: record.expires_in,
            expires_at: record.expires_at,
            scope: record.scope,
        })
    }
}

impl From<OAuthToken> for TokenRecord {
    fn from(token: OAuthToken) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
            expires_at: token.expires_at,
            scope: token.scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_issue_computes_expiry() {
        let token = OAuthToken::issue("access123", 3600, at(1_000)).unwrap();
        assert_eq!(token.access_token(), "access123");
        assert_eq!(token.expires_at(), 4_600);
        assert_eq!(token.token_type(), "bearer");
        assert!(token.refresh_token().is_none());
    }

    #[test]
    fn test_issue_rejects_empty_access_token() {
        let err = OAuthToken::issue("", 3600, at(0)).unwrap_err();
        assert!(matches!(err, AuthError::Authorization(_)));
    }

    #[test]
    fn test_expiry_boundaries() {
        let token = OAuthToken::issue("a", 60, at(100)).unwrap();
        assert!(!token.is_expired_at(at(159)));
        assert!(token.is_expired_at(at(160)));
        assert!(token.expires_within(at(150), Duration::from_secs(10)));
        assert!(!token.expires_within(at(149), Duration::from_secs(10)));
    }

    #[test]
    fn test_empty_refresh_token_is_dropped() {
        let token = OAuthToken::issue("a", 60, at(0))
            .unwrap()
            .with_refresh_token(Some(String::new()));
        assert!(token.refresh_token().is_none());
    }

    #[test]
    fn test_authorization_header() {
        let token = OAuthToken::issue("access123", 60, SystemTime::now()).unwrap();
        assert_eq!(token.authorization_header(), "bearer access123");
    }

    #[test]
    fn test_record_round_trip_preserves_fields() {
        let token = OAuthToken::issue("tok1", 3600, at(10_000))
            .unwrap()
            .with_refresh_token(Some("ref1".to_string()))
            .with_token_type(Some("bearer".to_string()))
            .with_scope(Some("submit".to_string()));

        let json = serde_json::to_string(&token).unwrap();
        let restored: OAuthToken = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, token);
        assert_eq!(restored.refresh_token(), Some("ref1"));
        assert_eq!(restored.expires_in(), 3600);
        assert!(!restored.is_expired_at(at(13_599)));
        assert!(restored.is_expired_at(at(13_600)));
    }

    #[test]
    fn test_record_uses_wire_field_names() {
        let token = OAuthToken::issue("tok1", 3600, at(0))
            .unwrap()
            .with_refresh_token(Some("ref1".to_string()));
        let value = serde_json::to_value(&token).unwrap();

        assert_eq!(value["access_token"], "tok1");
        assert_eq!(value["refresh_token"], "ref1");
        assert_eq!(value["token_type"], "bearer");
        assert_eq!(value["expires_in"], 3600);
        assert_eq!(value["expires_at"], 3600);
        assert!(value.get("scope").is_none());
    }

    #[test]
    fn test_deserialize_rejects_empty_access_token() {
        let result: std::result::Result<OAuthToken, _> =
            serde_json::from_str(r#"{"access_token":"","expires_at":100}"#);
        assert!(result.is_err());
    }
}
