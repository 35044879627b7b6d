//! Per-account authorization state

use futures::future::{BoxFuture, Shared};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use crate::error::{AuthError, Result};
use crate::storage::AccountRecord;
use crate::types::{AuthStatus, ClientCredential, OAuthToken};

/// Outcome of an in-flight refresh, shared by every waiter
pub(crate) type SharedRefresh = Shared<BoxFuture<'static, Result<Arc<OAuthToken>>>>;

/// What a caller has to do after checking the stored token
pub(crate) enum Admission {
    /// The stored token is usable
    Valid(Arc<OAuthToken>),
    /// Wait for the in-flight refresh
    Wait(SharedRefresh),
}

struct InFlight {
    ticket: u64,
    refresh: SharedRefresh,
}

#[derive(Default)]
struct TokenSlot {
    token: Option<Arc<OAuthToken>>,
    refresh_failed: bool,
    in_flight: Option<InFlight>,
    next_ticket: u64,
}

/// A configured account: its client credential and its current token.
///
/// The token is swapped as a whole under a lock, so readers see either the
/// old or the new token, never a mix. At most one refresh is in flight.
pub struct AuthorizationState {
    credential: ClientCredential,
    slot: Mutex<TokenSlot>,
}

impl AuthorizationState {
    /// Create a state for a freshly configured account (no token yet)
    #[must_use]
    pub fn new(credential: ClientCredential) -> Self {
        Self {
            credential,
            slot: Mutex::new(TokenSlot::default()),
        }
    }

    /// Create a state with a previously issued token
    #[must_use]
    pub fn with_token(credential: ClientCredential, token: OAuthToken) -> Self {
        let state = Self::new(credential);
        state.lock().token = Some(Arc::new(token));
        state
    }

    /// Restore a state from its persisted record
    #[must_use]
    pub fn from_record(record: AccountRecord) -> Self {
        match record.token {
            Some(token) => Self::with_token(record.credential, token),
            None => Self::new(record.credential),
        }
    }

    /// Client credential of this account
    #[must_use]
    pub fn credential(&self) -> &ClientCredential {
        &self.credential
    }

    /// Snapshot of the current token
    #[must_use]
    pub fn token(&self) -> Option<Arc<OAuthToken>> {
        self.lock().token.clone()
    }

    /// Lifecycle status at `now`
    #[must_use]
    pub fn status_at(&self, now: SystemTime, skew: Duration) -> AuthStatus {
        let slot = self.lock();
        match &slot.token {
            None => AuthStatus::Unauthenticated,
            Some(token) if token.expires_within(now, skew) => {
                if slot.refresh_failed {
                    AuthStatus::Unauthenticated
                } else {
                    AuthStatus::Expired
                }
            }
            Some(_) => AuthStatus::Authenticated,
        }
    }

    /// Snapshot for persistence
    #[must_use]
    pub fn record(&self) -> AccountRecord {
        AccountRecord {
            credential: self.credential.clone(),
            token: self.token().map(|t| OAuthToken::clone(&t)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TokenSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide under the lock whether the token is usable, an in-flight
    /// refresh should be joined, or a new refresh has to start.
    ///
    /// `start` runs with the lock held and must not block. Its flag tells
    /// whether the token had already expired, which is when a failure of
    /// that refresh leaves the account unauthenticated.
    pub(crate) fn admit<F>(
        &self,
        now: SystemTime,
        skew: Duration,
        force: bool,
        start: F,
    ) -> Result<Admission>
    where
        F: FnOnce(u64, Arc<OAuthToken>, bool) -> SharedRefresh,
    {
        let mut slot = self.lock();

        let Some(current) = slot.token.clone() else {
            return Err(if force {
                AuthError::configuration("no token to refresh")
            } else {
                AuthError::LoginRequired
            });
        };

        let expired = current.expires_within(now, skew);
        if !force && !expired {
            return Ok(Admission::Valid(current));
        }

        if let Some(in_flight) = &slot.in_flight {
            tracing::debug!(ticket = in_flight.ticket, "Joining in-flight refresh");
            return Ok(Admission::Wait(in_flight.refresh.clone()));
        }

        let ticket = slot.next_ticket;
        slot.next_ticket += 1;
        tracing::debug!(ticket, expired, "Starting token refresh");

        let refresh = start(ticket, current, expired);
        slot.in_flight = Some(InFlight {
            ticket,
            refresh: refresh.clone(),
        });
        Ok(Admission::Wait(refresh))
    }

    /// Record the outcome of refresh `ticket` that started from `current`.
    ///
    /// The new token is stored only if `current` is still the stored token;
    /// a logout or a new code exchange in the meantime wins. A failure marks
    /// the account only when `current` had already expired.
    pub(crate) fn complete_refresh(
        &self,
        ticket: u64,
        current: &Arc<OAuthToken>,
        started_expired: bool,
        result: Result<OAuthToken>,
    ) -> Result<Arc<OAuthToken>> {
        let mut slot = self.lock();
        if slot.in_flight.as_ref().is_some_and(|f| f.ticket == ticket) {
            slot.in_flight = None;
        }

        let still_current = slot
            .token
            .as_ref()
            .is_some_and(|t| Arc::ptr_eq(t, current));

        match result {
            Ok(token) => {
                let token = Arc::new(token);
                if still_current {
                    slot.token = Some(Arc::clone(&token));
                    slot.refresh_failed = false;
                } else {
                    tracing::debug!(ticket, "Stored token changed during refresh; result not stored");
                }
                Ok(token)
            }
            Err(e) => {
                if still_current && started_expired {
                    slot.refresh_failed = true;
                }
                Err(e)
            }
        }
    }

    /// Forget refresh `ticket` whose task ended without an outcome
    pub(crate) fn abandon_refresh(&self, ticket: u64) {
        let mut slot = self.lock();
        if slot.in_flight.as_ref().is_some_and(|f| f.ticket == ticket) {
            slot.in_flight = None;
        }
    }

    pub(crate) fn replace_token(&self, token: OAuthToken) -> Arc<OAuthToken> {
        let token = Arc::new(token);
        let mut slot = self.lock();
        slot.token = Some(Arc::clone(&token));
        slot.refresh_failed = false;
        token
    }

    pub(crate) fn clear_token(&self) {
        let mut slot = self.lock();
        slot.token = None;
        slot.refresh_failed = false;
    }
}

impl fmt::Debug for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.lock();
        f.debug_struct("AuthorizationState")
            .field("credential", &self.credential)
            .field("has_token", &slot.token.is_some())
            .field("refresh_failed", &slot.refresh_failed)
            .field("refresh_in_flight", &slot.in_flight.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::time::UNIX_EPOCH;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn credential() -> ClientCredential {
        ClientCredential::new("id", "secret", "https://localhost/cb")
    }

    fn token(issued: u64) -> OAuthToken {
        OAuthToken::issue("access", 100, at(issued))
            .unwrap()
            .with_refresh_token(Some("refresh".to_string()))
    }

    fn pending() -> SharedRefresh {
        futures::future::pending().boxed().shared()
    }

    #[test]
    fn test_status_transitions() {
        let state = AuthorizationState::new(credential());
        assert_eq!(
            state.status_at(at(0), Duration::ZERO),
            AuthStatus::Unauthenticated
        );

        state.replace_token(token(0));
        assert_eq!(
            state.status_at(at(50), Duration::ZERO),
            AuthStatus::Authenticated
        );
        assert_eq!(state.status_at(at(100), Duration::ZERO), AuthStatus::Expired);
        assert_eq!(
            state.status_at(at(95), Duration::from_secs(10)),
            AuthStatus::Expired
        );
    }

    #[test]
    fn test_admit_without_token() {
        let state = AuthorizationState::new(credential());
        let err = state
            .admit(at(0), Duration::ZERO, false, |_, _, _| pending())
            .err()
            .unwrap();
        assert_eq!(err, AuthError::LoginRequired);

        let err = state
            .admit(at(0), Duration::ZERO, true, |_, _, _| pending())
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn test_admit_valid_token_starts_nothing() {
        let state = AuthorizationState::with_token(credential(), token(0));
        let admission = state
            .admit(at(10), Duration::ZERO, false, |_, _, _| panic!("refresh started"))
            .unwrap();
        assert!(matches!(admission, Admission::Valid(_)));
    }

    #[test]
    fn test_admit_starts_one_refresh() {
        let state = AuthorizationState::with_token(credential(), token(0));
        let mut started = 0;

        for _ in 0..3 {
            let admission = state
                .admit(at(500), Duration::ZERO, false, |_, _, _| {
                    started += 1;
                    pending()
                })
                .unwrap();
            assert!(matches!(admission, Admission::Wait(_)));
        }
        assert_eq!(started, 1);
    }

    #[test]
    fn test_complete_refresh_replaces_token() {
        let state = AuthorizationState::with_token(credential(), token(0));
        let mut current = None;
        state
            .admit(at(500), Duration::ZERO, false, |_, token, expired| {
                assert!(expired);
                current = Some(token);
                pending()
            })
            .unwrap();
        let current = current.unwrap();

        let stored = state
            .complete_refresh(0, &current, true, Ok(token(500)))
            .unwrap();
        assert!(Arc::ptr_eq(&state.token().unwrap(), &stored));
        assert_eq!(
            state.status_at(at(550), Duration::ZERO),
            AuthStatus::Authenticated
        );
        assert!(state.lock().in_flight.is_none());
    }

    #[test]
    fn test_failed_refresh_keeps_token_and_downgrades() {
        let state = AuthorizationState::with_token(credential(), token(0));
        let before = state.token().unwrap();

        let result =
            state.complete_refresh(0, &before, true, Err(AuthError::authorization("invalid_grant")));
        assert!(result.is_err());
        assert!(Arc::ptr_eq(&state.token().unwrap(), &before));
        assert_eq!(
            state.status_at(at(500), Duration::ZERO),
            AuthStatus::Unauthenticated
        );
    }

    #[test]
    fn test_failed_early_refresh_leaves_expiry_to_the_clock() {
        let state = AuthorizationState::with_token(credential(), token(0));
        let mut started_expired = None;
        state
            .admit(at(10), Duration::ZERO, true, |_, _, expired| {
                started_expired = Some(expired);
                pending()
            })
            .unwrap();
        assert_eq!(started_expired, Some(false));

        let before = state.token().unwrap();
        let result =
            state.complete_refresh(0, &before, false, Err(AuthError::configuration("no refresh")));
        assert!(result.is_err());
        assert_eq!(
            state.status_at(at(50), Duration::ZERO),
            AuthStatus::Authenticated
        );
        assert_eq!(state.status_at(at(500), Duration::ZERO), AuthStatus::Expired);
    }

    #[test]
    fn test_refresh_result_discarded_after_logout() {
        let state = AuthorizationState::with_token(credential(), token(0));
        let before = state.token().unwrap();
        state.clear_token();

        let result = state.complete_refresh(0, &before, true, Ok(token(500)));
        assert!(result.is_ok());
        assert!(state.token().is_none());
    }

    #[test]
    fn test_record_round_trip() {
        let state = AuthorizationState::with_token(credential(), token(0));
        let restored = AuthorizationState::from_record(state.record());
        assert_eq!(restored.credential(), state.credential());
        assert_eq!(restored.token(), state.token());
    }
}
