//! Error types for OAuth authorization

use thiserror::Error;

/// Main error type for authorization operations
///
/// Errors are `Clone` because the outcome of a single-flighted refresh is
/// handed to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing credential fields, empty authorization code or no refresh token
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport failure or timeout talking to the provider
    #[error("Network error: {message}")]
    Network {
        /// Error message
        message: String,
        /// Whether resubmitting the same request may succeed
        retryable: bool,
    },

    /// Non-2xx status or a body that is not a token response
    #[error("Protocol error{}: {message}", http_status_suffix(.status))]
    Protocol {
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// Provider answered but granted no usable access token
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// No token is stored; the user has to log in
    #[error("Login is required.")]
    LoginRequired,

    /// The stored token expired and refreshing it failed
    #[error("Refresh access token failed: {0}")]
    RefreshFailed(Box<AuthError>),

    /// Caller cancelled while waiting
    #[error("Operation cancelled")]
    Cancelled,

    /// Account storage failed
    #[error("Storage error: {0}")]
    Storage(String),
}

fn http_status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Result type alias for authorization operations
pub type Result<T> = std::result::Result<T, AuthError>;

impl AuthError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>, retryable: bool) -> Self {
        Self::Network {
            message: msg.into(),
            retryable,
        }
    }

    /// Create a network error for a request that hit its deadline
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::network(msg, true)
    }

    /// Create a protocol error
    pub fn protocol(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Protocol {
            status,
            message: msg.into(),
        }
    }

    /// Create an authorization error
    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Wrap an underlying refresh failure
    #[must_use]
    pub fn refresh_failed(cause: AuthError) -> Self {
        Self::RefreshFailed(Box::new(cause))
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether resubmitting the failed operation may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { retryable, .. } => *retryable,
            Self::RefreshFailed(cause) => cause.is_retryable(),
            _ => false,
        }
    }

    /// Whether the host should prompt the user to authorize again
    #[must_use]
    pub fn requires_login(&self) -> bool {
        match self {
            Self::LoginRequired => true,
            Self::RefreshFailed(cause) => !cause.is_retryable(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::protocol(err.status().map(|s| s.as_u16()), err.to_string())
        } else {
            Self::network(err.to_string(), err.is_connect() || err.is_request())
        }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
