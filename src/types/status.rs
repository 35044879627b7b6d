//! Authorization status as seen by the host

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an account sits in the token lifecycle
///
/// ```text
/// Unauthenticated --exchange--> Authenticated --clock--> Expired
/// Expired --refresh ok--> Authenticated
/// Expired --refresh failed--> Unauthenticated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// No usable token; the user has to log in
    Unauthenticated,
    /// A token is stored and still valid
    Authenticated,
    /// A token is stored but expired; the next check refreshes it
    Expired,
}

impl AuthStatus {
    /// Whether privileged calls can proceed without a refresh
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::Expired => "expired",
        };
        f.write_str(label)
    }
}
