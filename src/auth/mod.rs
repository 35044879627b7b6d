//! OAuth 2.0 authorization-code client
//!
//! # Overview
//!
//! The flow works as follows:
//!
//! 1. The host opens [`build_authorization_url`] in a browser
//! 2. The user approves access on the content host
//! 3. The host's callback receiver extracts the authorization code
//! 4. [`TokenExchanger`] turns the code into an [`OAuthToken`](crate::OAuthToken)
//! 5. [`AuthorizationGate::ensure_valid`] is called before every privileged
//!    operation and refreshes expired tokens through [`TokenRefresher`]
//!
//! # Concurrency
//!
//! Refreshes of one account are single-flighted: concurrent callers that find
//! the token expired share one request to the token endpoint. Many providers
//! invalidate a refresh token on first use, so parallel refreshes would leave
//! all but one caller holding a dead refresh token.
//!
//! # Security
//!
//! - The user's host password is never seen; only tokens are stored
//! - Client secrets and tokens are redacted from `Debug` output and logs
//! - Every token endpoint request is bounded by [`OAuthConfig::timeout`](crate::OAuthConfig)

mod endpoint;
mod exchange;
mod gate;
mod refresh;
mod state;
mod url;

pub use endpoint::TokenEndpoint;
pub use exchange::TokenExchanger;
pub use gate::{AuthorizationGate, Authorizer};
pub use refresh::TokenRefresher;
pub use state::AuthorizationState;
pub use url::build_authorization_url;
