//! Authorization gate: the entry point used before privileged operations

use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;

use super::endpoint::TokenEndpoint;
use super::exchange::TokenExchanger;
use super::refresh::TokenRefresher;
use super::state::{Admission, AuthorizationState, SharedRefresh};
use super::url::build_authorization_url;
use crate::error::{AuthError, Result};
use crate::storage::AccountRecord;
use crate::types::{AuthStatus, ClientCredential, OAuthConfig, OAuthToken};

/// Contract between an authorized account and the code that performs
/// privileged requests on its behalf (for example an upload transport).
///
/// Dispatchers hold an `Arc<dyn Authorizer>` and call
/// [`ensure_valid`](Authorizer::ensure_valid) before every request, aborting
/// if it fails.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// URL to open in a browser for user consent
    fn authorization_url(&self) -> String;

    /// Exchange the code returned to the redirect URI and store the token
    async fn exchange_code(&self, code: &str) -> Result<()>;

    /// Refresh the stored token now
    async fn refresh(&self) -> Result<()>;

    /// Make sure a usable token is stored, refreshing an expired one
    async fn ensure_valid(&self) -> Result<()>;
}

#[derive(Debug)]
struct GateInner {
    state: AuthorizationState,
    config: OAuthConfig,
    exchanger: TokenExchanger,
    refresher: TokenRefresher,
}

/// Orchestrates URL building, code exchange and refresh for one account.
///
/// Cloning the gate yields another handle to the same account. Concurrent
/// callers that find the token expired share a single refresh request; the
/// request runs in its own task, so a caller that stops waiting does not
/// cancel it for the others.
///
/// Refreshing spawns onto the current tokio runtime.
///
/// ```no_run
/// use uploader_oauth::{AuthorizationGate, AuthorizationState, ClientCredential, OAuthConfig};
///
/// # async fn example(code_from_callback: String) -> uploader_oauth::Result<()> {
/// let credential = ClientCredential::new("client-id", "client-secret", "https://localhost/callback");
/// let gate = AuthorizationGate::new(AuthorizationState::new(credential), OAuthConfig::default())?;
///
/// println!("Open {}", gate.authorization_url());
/// gate.exchange_code(&code_from_callback).await?;
///
/// // before every upload
/// gate.ensure_valid().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    inner: Arc<GateInner>,
}

impl AuthorizationGate {
    /// Create a gate owning `state`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the HTTP client cannot be built.
    pub fn new(state: AuthorizationState, config: OAuthConfig) -> Result<Self> {
        let endpoint = TokenEndpoint::new(&config)?;

        Ok(Self {
            inner: Arc::new(GateInner {
                state,
                exchanger: TokenExchanger::new(endpoint.clone()),
                refresher: TokenRefresher::new(endpoint),
                config,
            }),
        })
    }

    /// Create a gate for a credential with no token yet
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the HTTP client cannot be built.
    pub fn from_credential(credential: ClientCredential, config: OAuthConfig) -> Result<Self> {
        Self::new(AuthorizationState::new(credential), config)
    }

    /// Create a gate from a persisted account record
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the HTTP client cannot be built.
    pub fn from_record(record: AccountRecord, config: OAuthConfig) -> Result<Self> {
        Self::new(AuthorizationState::from_record(record), config)
    }

    /// Client credential of the account
    #[must_use]
    pub fn credential(&self) -> &ClientCredential {
        self.inner.state.credential()
    }

    /// Provider configuration
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.inner.config
    }

    /// URL to open in a browser for user consent
    #[must_use]
    pub fn authorization_url(&self) -> String {
        build_authorization_url(self.credential(), &self.inner.config)
    }

    /// Exchange an authorization code and store the resulting token
    ///
    /// Nothing is stored when the exchange fails.
    ///
    /// # Errors
    ///
    /// See [`TokenExchanger::exchange`].
    pub async fn exchange_code(&self, code: &str) -> Result<Arc<OAuthToken>> {
        let token = self
            .inner
            .exchanger
            .exchange(self.credential(), code)
            .await?;
        Ok(self.inner.state.replace_token(token))
    }

    /// Succeed if a usable token is stored, refreshing it once expired
    ///
    /// # Errors
    ///
    /// - `LoginRequired` when no token is stored
    /// - `RefreshFailed` when the token expired and refreshing failed; the
    ///   stale token and the credential are kept
    pub async fn ensure_valid(&self) -> Result<()> {
        self.valid_token().await.map(|_| ())
    }

    /// Like [`ensure_valid`](Self::ensure_valid), returning the usable token
    ///
    /// # Errors
    ///
    /// Same as [`ensure_valid`](Self::ensure_valid).
    pub async fn valid_token(&self) -> Result<Arc<OAuthToken>> {
        match self.admit(false)? {
            Admission::Valid(token) => Ok(token),
            Admission::Wait(refresh) => refresh.await.map_err(AuthError::refresh_failed),
        }
    }

    /// [`ensure_valid`](Self::ensure_valid) that gives up when `cancel` fires
    ///
    /// A refresh already in flight keeps running for other callers.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Cancelled` if `cancel` fires first.
    pub async fn ensure_valid_or_cancel(&self, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("Stopped waiting for authorization");
                Err(AuthError::Cancelled)
            }
            result = self.ensure_valid() => result,
        }
    }

    /// Refresh the token now, whether or not it has expired
    ///
    /// Joins a refresh that is already in flight instead of starting another.
    ///
    /// # Errors
    ///
    /// `Configuration` when no token or refresh token is stored, otherwise
    /// the error of the refresh request itself.
    pub async fn refresh(&self) -> Result<Arc<OAuthToken>> {
        match self.admit(true)? {
            Admission::Valid(token) => Ok(token),
            Admission::Wait(refresh) => refresh.await,
        }
    }

    /// Current lifecycle status
    #[must_use]
    pub fn status(&self) -> AuthStatus {
        self.inner
            .state
            .status_at(SystemTime::now(), self.inner.config.expiry_skew)
    }

    /// Whether a stored token is currently usable without refreshing
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status().is_authenticated()
    }

    /// Stored token, expired or not
    #[must_use]
    pub fn current_token(&self) -> Option<Arc<OAuthToken>> {
        self.inner.state.token()
    }

    /// Drop the stored token; the credential is kept
    pub fn logout(&self) {
        self.inner.state.clear_token();
        tracing::info!(client_id = self.credential().client_id(), "Logged out");
    }

    /// Snapshot for persistence
    #[must_use]
    pub fn record(&self) -> AccountRecord {
        self.inner.state.record()
    }

    fn admit(&self, force: bool) -> Result<Admission> {
        self.inner.state.admit(
            SystemTime::now(),
            self.inner.config.expiry_skew,
            force,
            |ticket, current, expired| self.spawn_refresh(ticket, current, expired),
        )
    }

    fn spawn_refresh(
        &self,
        ticket: u64,
        current: Arc<OAuthToken>,
        started_expired: bool,
    ) -> SharedRefresh {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let result = inner
                .refresher
                .refresh(inner.state.credential(), Some(&current))
                .await;
            inner
                .state
                .complete_refresh(ticket, &current, started_expired, result)
        });

        let inner = Arc::clone(&self.inner);
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    inner.state.abandon_refresh(ticket);
                    Err(AuthError::network(format!("refresh task ended: {e}"), false))
                }
            }
        }
        .boxed()
        .shared()
    }
}

#[async_trait]
impl Authorizer for AuthorizationGate {
    fn authorization_url(&self) -> String {
        AuthorizationGate::authorization_url(self)
    }

    async fn exchange_code(&self, code: &str) -> Result<()> {
        AuthorizationGate::exchange_code(self, code).await.map(|_| ())
    }

    async fn refresh(&self) -> Result<()> {
        AuthorizationGate::refresh(self).await.map(|_| ())
    }

    async fn ensure_valid(&self) -> Result<()> {
        AuthorizationGate::ensure_valid(self).await
    }
}
