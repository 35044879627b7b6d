//! # uploader-oauth
//!
//! OAuth 2.0 authorization-code client for uploaders that act on a user's
//! account at a content host (Reddit by default) without ever seeing the
//! user's password. Async/await, strong typing, tokio-based.
//!
//! ## Quick Start
//!
//! ```no_run
//! use uploader_oauth::{AuthorizationGate, ClientCredential, OAuthConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credential = ClientCredential::new(
//!         "client-id",
//!         "client-secret",
//!         "https://localhost/callback",
//!     );
//!     let gate = AuthorizationGate::from_credential(credential, OAuthConfig::default())?;
//!
//!     // 1. Send the user to the consent page
//!     println!("Open: {}", gate.authorization_url());
//!
//!     // 2. Your callback receiver hands over the code
//!     let code = "code-from-redirect";
//!     gate.exchange_code(code).await?;
//!
//!     // 3. Before each privileged request
//!     let token = gate.valid_token().await?;
//!     println!("Authorization: {}", token.authorization_header());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`]: credential, token, configuration and status types
//! - [`auth`]: URL builder, code exchange, refresh and the authorization gate
//! - [`storage`]: serializable account record and a file-backed store
//! - [`error`]: error types and handling
//! - [`utils`]: time and string helpers
//!
//! Hosts plug in at three seams:
//!
//! - a callback receiver passes the authorization code to
//!   [`AuthorizationGate::exchange_code`]
//! - a settings store persists [`AccountRecord`] (or uses [`AccountStore`])
//! - a privileged operation dispatcher holds an [`Authorizer`] and calls
//!   [`Authorizer::ensure_valid`] before each request
//!
//! ## Logging
//!
//! This crate uses [`tracing`](https://crates.io/crates/tracing) for structured logging.
//! Tracing events are always emitted but are zero-cost when no subscriber is attached.
//! Secrets are never logged in full. To see logs, attach a subscriber:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, AuthError>`](Result):
//!
//! ```no_run
//! # use uploader_oauth::{AuthError, AuthorizationGate};
//! # async fn example(gate: AuthorizationGate) {
//! match gate.ensure_valid().await {
//!     Ok(()) => { /* upload */ }
//!     Err(e) if e.requires_login() => {
//!         eprintln!("Please authorize again: {}", gate.authorization_url());
//!     }
//!     Err(e) if e.is_retryable() => {
//!         eprintln!("Temporary failure, try again later: {e}");
//!     }
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod error;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use auth::{
    AuthorizationGate, AuthorizationState, Authorizer, TokenEndpoint, TokenExchanger,
    TokenRefresher, build_authorization_url,
};
pub use error::{AuthError, Result};
pub use storage::{AccountRecord, AccountStore};
pub use types::{
    AuthStatus, ClientCredential, OAuthConfig, OAuthConfigBuilder, OAuthToken, TokenDuration,
    TokenRecord,
};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
