//! Type definitions for OAuth authorization
//!
//! Client registration data, token snapshots, provider configuration and the
//! lifecycle status reported to hosts.

pub mod config;
pub mod credential;
pub mod status;
pub mod token;

pub use config::{OAuthConfig, OAuthConfigBuilder, TokenDuration};
pub use credential::ClientCredential;
pub use status::AuthStatus;
pub use token::{DEFAULT_EXPIRES_IN, OAuthToken, TokenRecord};
