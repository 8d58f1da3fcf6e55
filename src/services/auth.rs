/**
 * Authentication Session
 *
 * Tracks the session with the market data backend.
 * - Login goes through a pluggable `Authenticator`
 * - A failed login schedules a one-shot retry on a timer
 * - Retries are bounded per chain; each explicit login starts a new chain
 */

use crate::config::AuthConfig;
use crate::error::{AppError, Result};
use crate::types::{AuthState, Credentials};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Token handed out by the simulated backend.
pub const SIMULATED_TOKEN: &str = "simulated-auth-token";

/// Backend that exchanges credentials for a bearer token.
pub trait Authenticator: Send + Sync {
    fn login(&self, credentials: &Credentials) -> Result<String>;
}

/// Stand-in backend: accepts any non-blank credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedAuthenticator;

impl Authenticator for SimulatedAuthenticator {
    fn login(&self, credentials: &Credentials) -> Result<String> {
        if credentials.is_blank() {
            return Err(AppError::AuthFailed("email and password are required".into()));
        }
        Ok(SIMULATED_TOKEN.to_string())
    }
}

/// Session with the market data backend.
#[derive(Clone)]
pub struct AuthSession {
    state: Arc<RwLock<AuthState>>,
    backend: Arc<dyn Authenticator>,
    credentials: Arc<Credentials>,
    retry_delay: Duration,
    max_retries: u32,
    /// Retries scheduled in the current chain.
    retries: Arc<AtomicU32>,
    pending_retry: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AuthSession {
    /// Create an unauthenticated session. No login is attempted yet.
    pub fn new(backend: Arc<dyn Authenticator>, config: &AuthConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(AuthState::default())),
            backend,
            credentials: Arc::new(config.credentials.clone()),
            retry_delay: config.retry_delay,
            max_retries: config.max_retries,
            retries: Arc::new(AtomicU32::new(0)),
            pending_retry: Arc::new(Mutex::new(None)),
        }
    }

    /// Attempt to log in. On failure a retry with the configured credentials
    /// is scheduled after the retry delay.
    pub async fn authenticate(&self, credentials: &Credentials) -> bool {
        if self.try_login(credentials) {
            return true;
        }
        self.schedule_retry(true);
        false
    }

    /// Log in with the configured credentials.
    pub async fn authenticate_default(&self) -> bool {
        let credentials = self.credentials.clone();
        self.authenticate(&credentials).await
    }

    /// Return immediately when logged in, otherwise attempt a login.
    pub async fn ensure_authenticated(&self) -> bool {
        if self.is_authenticated() {
            debug!("Already authenticated");
            return true;
        }
        info!("Not authenticated, attempting to authenticate");
        self.authenticate_default().await
    }

    /// Drop the session.
    pub fn sign_out(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = AuthState::default();
        info!("Signed out of market data backend");
    }

    /// Abort a pending retry timer.
    pub fn shutdown(&self) {
        let mut pending = self.pending_retry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authenticated
    }

    pub fn token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    pub fn state(&self) -> AuthState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Fail with `NotAuthenticated` unless logged in.
    pub fn require(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(AppError::NotAuthenticated)
        }
    }

    fn try_login(&self, credentials: &Credentials) -> bool {
        info!("Authenticating with market data backend as {}", credentials.email);

        match self.backend.login(credentials) {
            Ok(token) => {
                let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                state.is_authenticated = true;
                state.token = Some(token);
                self.retries.store(0, Ordering::SeqCst);
                info!("Authentication successful");
                true
            }
            Err(e) => {
                let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                *state = AuthState::default();
                warn!("Authentication failed: {}", e);
                false
            }
        }
    }

    /// Spawn a one-shot retry unless one is pending or the budget is spent.
    /// `new_chain` restores the full budget for a fresh explicit attempt.
    fn schedule_retry(&self, new_chain: bool) {
        let mut pending = self.pending_retry.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        if new_chain {
            self.retries.store(0, Ordering::SeqCst);
        }

        let attempt = self.retries.load(Ordering::SeqCst);
        if attempt >= self.max_retries {
            warn!(
                "Authentication retries exhausted after {} attempts, waiting for next request",
                attempt
            );
            return;
        }
        self.retries.store(attempt + 1, Ordering::SeqCst);

        debug!(
            "Scheduling authentication retry {}/{} in {:?}",
            attempt + 1,
            self.max_retries,
            self.retry_delay
        );

        let session = self.clone();
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(session.retry_delay).await;
            let credentials = session.credentials.clone();
            if !session.try_login(&credentials) {
                session.clear_pending();
                session.schedule_retry(false);
            }
        }));
    }

    fn clear_pending(&self) {
        let mut pending = self.pending_retry.lock().unwrap_or_else(PoisonError::into_inner);
        pending.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Fails the first `failures` logins.
    struct FlakyAuthenticator {
        failures: usize,
        calls: AtomicUsize,
    }

    impl Authenticator for FlakyAuthenticator {
        fn login(&self, _credentials: &Credentials) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(AppError::AuthFailed("backend unavailable".into()))
            } else {
                Ok("flaky-token".into())
            }
        }
    }

    fn flaky(failures: usize) -> Arc<FlakyAuthenticator> {
        Arc::new(FlakyAuthenticator {
            failures,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_authenticate_sets_token() {
        let session = AuthSession::new(Arc::new(SimulatedAuthenticator), &AuthConfig::default());
        assert!(!session.is_authenticated());
        assert!(session.require().is_err());

        assert!(session.authenticate_default().await);
        assert_eq!(session.token().as_deref(), Some(SIMULATED_TOKEN));
        assert!(session.require().is_ok());
    }

    #[tokio::test]
    async fn test_blank_credentials_fail() {
        let session = AuthSession::new(Arc::new(SimulatedAuthenticator), &AuthConfig::default());
        assert!(!session.authenticate(&Credentials::new("", "")).await);
        assert_eq!(session.state(), AuthState::default());
        session.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_login_retries_after_delay() {
        let backend = flaky(1);
        let session = AuthSession::new(backend.clone(), &AuthConfig::default());

        assert!(!session.authenticate_default().await);
        assert!(!session.is_authenticated());

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert!(session.is_authenticated());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_are_bounded() {
        let backend = flaky(usize::MAX);
        let config = AuthConfig {
            max_retries: 2,
            ..AuthConfig::default()
        };
        let session = AuthSession::new(backend.clone(), &config);

        assert!(!session.authenticate_default().await);
        tokio::time::sleep(Duration::from_secs(30)).await;

        // initial attempt plus two retries
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        assert!(!session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_attempt_gets_fresh_retry_budget() {
        let backend = flaky(usize::MAX);
        let config = AuthConfig {
            max_retries: 1,
            ..AuthConfig::default()
        };
        let session = AuthSession::new(backend.clone(), &config);

        assert!(!session.authenticate_default().await);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);

        // the first chain is spent; a later attempt still gets its retry
        assert!(!session.authenticate_default().await);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_ensure_authenticated_short_circuits() {
        let backend = flaky(0);
        let session = AuthSession::new(backend.clone(), &AuthConfig::default());

        assert!(session.ensure_authenticated().await);
        assert!(session.ensure_authenticated().await);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        session.sign_out();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
    }
}
