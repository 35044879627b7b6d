//! Client registration data

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static OAuth client registration: client id, client secret and the
/// redirect URI registered with the provider.
///
/// Immutable once constructed; share it by cloning or behind an `Arc`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredential {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl ClientCredential {
    /// Create a new credential
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// OAuth client identifier
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// OAuth client secret
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Redirect URI registered with the provider
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Whether both the client id and the client secret are filled in
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }

    /// Name of the first missing field, if any
    pub(crate) fn missing_field(&self) -> Option<&'static str> {
        if self.client_id.trim().is_empty() {
            Some("client_id")
        } else if self.client_secret.trim().is_empty() {
            Some("client_secret")
        } else {
            None
        }
    }
}

impl fmt::Debug for ClientCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredential")
            .field("client_id", &self.client_id)
            .field("client_secret_set", &!self.client_secret.is_empty())
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let credential = ClientCredential::new("id", "super-secret", "https://localhost/cb");
        let debug = format!("{credential:?}");
        assert!(debug.contains("client_secret_set: true"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(
            ClientCredential::new("", "secret", "").missing_field(),
            Some("client_id")
        );
        assert_eq!(
            ClientCredential::new("id", "  ", "").missing_field(),
            Some("client_secret")
        );
        let complete = ClientCredential::new("id", "secret", "https://localhost/cb");
        assert_eq!(complete.missing_field(), None);
        assert!(complete.is_complete());
    }

    #[test]
    fn test_serde_field_names() {
        let credential = ClientCredential::new("id", "secret", "https://localhost/cb");
        let json = serde_json::to_value(&credential).unwrap();
        assert_eq!(json["client_id"], "id");
        assert_eq!(json["client_secret"], "secret");
        assert_eq!(json["redirect_uri"], "https://localhost/cb");

        let back: ClientCredential = serde_json::from_value(json).unwrap();
        assert_eq!(back, credential);
    }
}
