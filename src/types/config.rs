//! Provider endpoints and client settings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use typed_builder::TypedBuilder;

// Reddit is the default content host
const DEFAULT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const DEFAULT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const DEFAULT_SCOPE: &str = "submit";
const DEFAULT_USER_AGENT: &str = concat!("uploader-oauth/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Token lifetime hint sent as the `duration` authorization parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenDuration {
    /// Access only; no refresh token is issued
    Temporary,
    /// A refresh token is issued alongside the access token
    #[default]
    Permanent,
}

impl TokenDuration {
    /// Wire value of the hint
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temporary => "temporary",
            Self::Permanent => "permanent",
        }
    }
}

impl fmt::Display for TokenDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth provider configuration
///
/// ```
/// use std::time::Duration;
/// use uploader_oauth::OAuthConfig;
///
/// let config = OAuthConfig::builder()
///     .scope("submit identity")
///     .timeout(Duration::from_secs(10))
///     .build();
/// assert_eq!(config.scope, "submit identity");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[builder(
    builder_method(doc = "Create a new builder for OAuthConfig"),
    builder_type(doc = "Builder for OAuthConfig", vis = "pub"),
    build_method(doc = "Build the OAuthConfig")
)]
pub struct OAuthConfig {
    /// Authorization endpoint opened in the browser
    #[builder(default = DEFAULT_AUTH_URL.to_string(), setter(into))]
    pub auth_url: String,

    /// Token endpoint for code exchange and refresh
    #[builder(default = DEFAULT_TOKEN_URL.to_string(), setter(into))]
    pub token_url: String,

    /// Space-separated scopes to request
    #[builder(default = DEFAULT_SCOPE.to_string(), setter(into))]
    pub scope: String,

    /// Lifetime hint for the authorization request
    #[builder(default)]
    pub duration: TokenDuration,

    /// Upper bound for every token endpoint request
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,

    /// Treat tokens as expired this long before their actual expiry
    #[builder(default = Duration::ZERO)]
    pub expiry_skew: Duration,

    /// `User-Agent` header sent to the token endpoint
    #[builder(default = DEFAULT_USER_AGENT.to_string(), setter(into))]
    pub user_agent: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
