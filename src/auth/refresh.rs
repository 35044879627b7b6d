//! Refresh token grant

use std::time::SystemTime;

use super::endpoint::{TokenEndpoint, require_complete};
use crate::error::{AuthError, Result};
use crate::types::{ClientCredential, OAuthToken};
use crate::utils::redact;

/// Obtains a new access token from a refresh token.
///
/// One call is one network request. Collapsing concurrent refreshes of the
/// same account is done by [`AuthorizationGate`](super::AuthorizationGate).
#[derive(Debug, Clone)]
pub struct TokenRefresher {
    endpoint: TokenEndpoint,
}

impl TokenRefresher {
    /// Create a refresher talking to `endpoint`
    #[must_use]
    pub fn new(endpoint: TokenEndpoint) -> Self {
        Self { endpoint }
    }

    /// Refresh `current`, returning its replacement
    ///
    /// If the provider omits `refresh_token` in its reply, the refresh token
    /// of `current` is carried over. `current` is never modified.
    ///
    /// # Errors
    ///
    /// - `Configuration` when there is no token, no refresh token or an
    ///   incomplete credential (no request is sent)
    /// - `Network`, `Protocol` or `Authorization` as for code exchange
    pub async fn refresh(
        &self,
        credential: &ClientCredential,
        current: Option<&OAuthToken>,
    ) -> Result<OAuthToken> {
        let current =
            current.ok_or_else(|| AuthError::configuration("no token to refresh"))?;
        let refresh_token = current
            .refresh_token()
            .ok_or_else(|| AuthError::configuration("token has no refresh_token"))?;
        require_complete(credential)?;

        let form = [
            ("client_id", credential.client_id()),
            ("client_secret", credential.client_secret()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        tracing::debug!(
            refresh_token = %redact(refresh_token),
            "Attempting token refresh"
        );

        let issued_at = SystemTime::now();
        let response = self
            .endpoint
            .request_token(&form)
            .await
            .inspect_err(|e| tracing::warn!("Token refresh failed: {e}"))?;

        // Providers commonly rotate only the access token
        let rotated = response
            .refresh_token
            .as_deref()
            .is_some_and(|t| !t.is_empty());
        let token = response
            .into_token(issued_at)
            .inspect_err(|e| tracing::warn!("Token refresh failed: {e}"))?;
        let token = if rotated {
            token
        } else {
            token.with_refresh_token(Some(refresh_token.to_string()))
        };

        tracing::info!(
            expires_at = token.expires_at(),
            rotated,
            "Access token refreshed"
        );
        Ok(token)
    }
}
