//! Timer-driven tests for the signal session, run on paused tokio time

use signaldesk::config::{AuthConfig, MarketConfig, RefreshConfig};
use signaldesk::error::{AppError, Result};
use signaldesk::services::{
    AuthSession, Authenticator, Entropy, MarketDataSimulator, SignalGenerator, SignalSession,
    SimulatedAuthenticator,
};
use signaldesk::types::{Completion, Credentials, RefreshState, TriggerRejected};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Backend whose availability can be switched during a test.
struct SwitchableAuthenticator {
    available: AtomicBool,
}

impl Authenticator for SwitchableAuthenticator {
    fn login(&self, _credentials: &Credentials) -> Result<String> {
        if self.available.load(Ordering::SeqCst) {
            Ok("switchable-token".into())
        } else {
            Err(AppError::AuthFailed("backend offline".into()))
        }
    }
}

fn session_with(backend: Arc<dyn Authenticator>, config: &RefreshConfig) -> Arc<SignalSession> {
    let auth = AuthSession::new(backend, &AuthConfig::default());
    let entropy = Entropy::seeded(21);
    let market_data = MarketDataSimulator::new(auth.clone(), entropy.clone(), &MarketConfig::default());
    let generator = SignalGenerator::new(market_data, entropy);
    SignalSession::new("EUR/USD OTC", generator, auth, config)
}

fn session(config: &RefreshConfig) -> Arc<SignalSession> {
    session_with(Arc::new(SimulatedAuthenticator), config)
}

#[tokio::test(start_paused = true)]
async fn test_trigger_logs_in_and_stores_signal() {
    let session = session(&RefreshConfig::default());

    let completion = session.trigger().await.unwrap();
    assert!(matches!(completion, Completion::Stored(_)));

    let rejected = session.trigger().await.unwrap_err();
    assert_eq!(
        rejected,
        TriggerRejected::CoolingDown {
            seconds_remaining: 60
        }
    );
    assert_eq!(session.view().history.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_generates_and_auto_refreshes() {
    let config = RefreshConfig {
        cooldown_secs: 5,
        ..RefreshConfig::default()
    };
    let session = session(&config);
    session.start();

    tokio::time::sleep(Duration::from_millis(10)).await;
    let view = session.view();
    assert_eq!(view.history.len(), 1);
    assert!(view.policy.cooldown_active);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(session.view().state, RefreshState::Idle);

    tokio::time::sleep(Duration::from_secs(55)).await;
    assert_eq!(session.view().history.len(), 2);

    session.stop();
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_lasts_full_period_after_store() {
    let session = session(&RefreshConfig::default());

    // store off a whole-second boundary
    tokio::time::sleep(Duration::from_millis(900)).await;
    session.trigger().await.unwrap();

    tokio::time::sleep(Duration::from_millis(59_500)).await;
    assert_eq!(
        session.view().state,
        RefreshState::Cooldown {
            seconds_remaining: 1
        }
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(session.view().state, RefreshState::Idle);

    session.stop();
}

#[tokio::test(start_paused = true)]
async fn test_disabled_auto_refresh_does_not_fire() {
    let config = RefreshConfig {
        cooldown_secs: 5,
        ..RefreshConfig::default()
    };
    let session = session(&config);
    session.set_auto_refresh(false);
    session.start();

    tokio::time::sleep(Duration::from_secs(130)).await;
    assert_eq!(session.view().history.len(), 1);
    assert!(!session.view().policy.auto_refresh_enabled);

    session.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_timers() {
    let config = RefreshConfig {
        cooldown_secs: 5,
        ..RefreshConfig::default()
    };
    let session = session(&config);
    session.start();
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.stop();

    tokio::time::sleep(Duration::from_secs(200)).await;
    let view = session.view();
    assert_eq!(view.history.len(), 1);
    // countdown stopped, so the cooldown never ran out
    assert!(view.policy.cooldown_active);
}

#[tokio::test(start_paused = true)]
async fn test_failed_generation_retries_then_exhausts() {
    let backend = Arc::new(SwitchableAuthenticator {
        available: AtomicBool::new(false),
    });
    let config = RefreshConfig {
        max_retries: 2,
        ..RefreshConfig::default()
    };
    let session = session_with(backend.clone(), &config);

    let completion = session.trigger().await.unwrap();
    assert_eq!(completion, Completion::RetryIn(Duration::from_secs(5)));
    assert_eq!(
        session.view().error.as_deref(),
        Some("Failed to generate signal: Authentication failed. Please try again.")
    );

    // retries at +5s and +10s, then give up
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(session.view().state, RefreshState::Exhausted);

    backend.available.store(true, Ordering::SeqCst);
    let completion = session.trigger().await.unwrap();
    assert!(matches!(completion, Completion::Stored(_)));
    assert!(session.view().error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_retry_succeeds_once_backend_recovers() {
    let backend = Arc::new(SwitchableAuthenticator {
        available: AtomicBool::new(false),
    });
    let session = session_with(backend.clone(), &RefreshConfig::default());

    session.trigger().await.unwrap();
    backend.available.store(true, Ordering::SeqCst);

    tokio::time::sleep(Duration::from_secs(6)).await;
    let view = session.view();
    assert_eq!(view.history.len(), 1);
    assert!(view.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_change_market_generates_for_new_market() {
    let session = session(&RefreshConfig::default());
    session.trigger().await.unwrap();

    assert!(session.change_market("EUR/USD OTC").await.is_none());

    let completion = session.change_market("GBP/USD").await.unwrap();
    match completion {
        Completion::Stored(signal) => assert_eq!(signal.market, "GBP/USD"),
        other => panic!("unexpected completion: {:?}", other),
    }

    let view = session.view();
    assert_eq!(view.history.len(), 1);
    assert_eq!(view.policy.active_market, "GBP/USD");
    assert_eq!(view.policy.cooldown_seconds_remaining, 60);
}
