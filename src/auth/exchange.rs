//! Authorization code exchange

use std::time::SystemTime;

use super::endpoint::{TokenEndpoint, require_complete};
use crate::error::{AuthError, Result};
use crate::types::{ClientCredential, OAuthToken};

/// Converts an authorization code into a token.
///
/// The exchanger never stores anything: the caller decides what to do with
/// the returned token.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    endpoint: TokenEndpoint,
}

impl TokenExchanger {
    /// Create an exchanger talking to `endpoint`
    #[must_use]
    pub fn new(endpoint: TokenEndpoint) -> Self {
        Self { endpoint }
    }

    /// Exchange an authorization code for a token
    ///
    /// # Errors
    ///
    /// - `Configuration` for an incomplete credential or an empty code (no request is sent)
    /// - `Network` on transport failure or timeout
    /// - `Protocol` on non-2xx status or a malformed body
    /// - `Authorization` when the provider grants no access token
    pub async fn exchange(&self, credential: &ClientCredential, code: &str) -> Result<OAuthToken> {
        require_complete(credential)?;

        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::configuration("authorization code is empty"));
        }

        let form = [
            ("client_id", credential.client_id()),
            ("redirect_uri", credential.redirect_uri()),
            ("client_secret", credential.client_secret()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ];

        tracing::debug!(
            client_id = credential.client_id(),
            token_url = self.endpoint.token_url(),
            "Exchanging authorization code"
        );

        let issued_at = SystemTime::now();
        let token = self
            .endpoint
            .request_token(&form)
            .await
            .and_then(|response| response.into_token(issued_at))
            .inspect_err(|e| tracing::warn!("Authorization code exchange failed: {e}"))?;

        tracing::info!(
            expires_at = token.expires_at(),
            has_refresh_token = token.refresh_token().is_some(),
            "Authorization code exchanged"
        );
        Ok(token)
    }
}
