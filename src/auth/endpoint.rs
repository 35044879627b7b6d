//! Token endpoint transport and response classification

use serde::Deserialize;
use serde_json::Value;
use std::time::SystemTime;

use crate::error::{AuthError, Result};
use crate::types::{ClientCredential, DEFAULT_EXPIRES_IN, OAuthConfig, OAuthToken};
use crate::utils::truncate_for_display;

/// Longest slice of a response body quoted in an error message
const MAX_BODY_IN_ERROR: usize = 200;

/// Successful response from the token endpoint
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Build a token issued at `issued_at`
    pub fn into_token(self, issued_at: SystemTime) -> Result<OAuthToken> {
        let access_token = self.access_token.unwrap_or_default();
        if access_token.is_empty() {
            return Err(AuthError::authorization(
                "token response has no access_token",
            ));
        }

        Ok(OAuthToken::issue(
            access_token,
            self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            issued_at,
        )?
        .with_refresh_token(self.refresh_token)
        .with_token_type(self.token_type)
        .with_scope(self.scope))
    }
}

/// Classify a token endpoint reply.
///
/// An explicit `error` payload is an authorization failure whatever the
/// status. Otherwise non-2xx statuses and non-JSON bodies are protocol
/// failures.
pub(crate) fn parse_token_response(status: u16, body: &str) -> Result<TokenResponse> {
    if let Some(msg) = error_payload(body) {
        return Err(AuthError::authorization(msg));
    }

    if !(200..300).contains(&status) {
        return Err(AuthError::protocol(
            Some(status),
            format!(
                "token endpoint returned {status}: {}",
                truncate_for_display(body, MAX_BODY_IN_ERROR)
            ),
        ));
    }

    serde_json::from_str::<TokenResponse>(body).map_err(|e| {
        AuthError::protocol(
            Some(status),
            format!(
                "failed to parse token response: {e} - Response: {}",
                truncate_for_display(body, MAX_BODY_IN_ERROR)
            ),
        )
    })
}

/// Message of a JSON object carrying a non-null `error` member.
///
/// Providers differ on its shape: `{"error":"invalid_grant"}` and
/// `{"message":"Unauthorized","error":401}` both count.
fn error_payload(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    let error = match value.get("error")? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let detail = ["error_description", "message"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|detail| !detail.is_empty());

    Some(match detail {
        Some(detail) => format!("{error}: {detail}"),
        None => error,
    })
}

/// HTTP access to the provider's token endpoint
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    http_client: reqwest::Client,
    token_url: String,
}

impl TokenEndpoint {
    /// Create an endpoint client bounded by `config.timeout`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: &OAuthConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| AuthError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            token_url: config.token_url.clone(),
        })
    }

    /// Token endpoint URL
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// POST a form-encoded grant and return the parsed response
    pub(crate) async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http_client
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::trace!(status, bytes = body.len(), "token endpoint replied");
        parse_token_response(status, &body)
    }
}

/// Reject credentials that cannot authenticate against the token endpoint
pub(crate) fn require_complete(credential: &ClientCredential) -> Result<()> {
    match credential.missing_field() {
        Some(field) => Err(AuthError::configuration(format!(
            "client credential is missing {field}"
        ))),
        None => Ok(()),
    }
}
