//! Integration tests for the signal refresh state machine

use signaldesk::config::RefreshConfig;
use signaldesk::error::AppError;
use signaldesk::services::SignalRefreshController;
use signaldesk::types::{
    Completion, RefreshState, Signal, SignalDirection, SignalIndicators, Timeframe, Trigger,
    TriggerRejected,
};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn signal(market: &str, id: &str) -> Signal {
    Signal {
        id: id.to_string(),
        market: market.to_string(),
        direction: SignalDirection::Buy,
        confidence: 80,
        timestamp: chrono::Utc::now().timestamp_millis(),
        indicators: SignalIndicators {
            rsi: 40,
            macd: "bullish crossover".into(),
            bollinger_bands: "lower band bounce".into(),
        },
        timeframe: None,
    }
}

fn failure() -> AppError {
    AppError::SignalGeneration("Authentication failed. Please try again.".into())
}

#[test]
fn test_second_manual_trigger_is_rejected_during_cooldown() {
    let mut controller = SignalRefreshController::new("EUR/USD OTC", &RefreshConfig::default());

    let ticket = controller.request(Trigger::Manual).unwrap();
    assert_eq!(controller.state(), RefreshState::Generating);
    assert_eq!(
        controller.request(Trigger::Manual),
        Err(TriggerRejected::InFlight)
    );

    let completion = controller.complete(&ticket, Ok(signal("EUR/USD OTC", "a")));
    assert!(matches!(completion, Completion::Stored(_)));
    assert_eq!(controller.history_len(), 1);
    assert_eq!(controller.cooldown_remaining(), 60);

    assert_eq!(
        controller.request(Trigger::Manual),
        Err(TriggerRejected::CoolingDown {
            seconds_remaining: 60
        })
    );
    assert_eq!(controller.history_len(), 1);
    assert!(controller.last_updated().is_some());
}

#[test]
fn test_market_switch_mid_cooldown_resets_session() {
    let mut controller = SignalRefreshController::new("EUR/USD OTC", &RefreshConfig::default());
    let ticket = controller.request(Trigger::Manual).unwrap();
    controller.complete(&ticket, Ok(signal("EUR/USD OTC", "a")));
    controller.tick();
    assert_eq!(controller.cooldown_remaining(), 59);

    let ticket = controller.set_market("GBP/USD").expect("market changed");
    assert_eq!(ticket.market, "GBP/USD");
    assert_eq!(ticket.trigger, Trigger::MarketChange);
    assert_eq!(controller.state(), RefreshState::Generating);
    assert_eq!(controller.history_len(), 0);
    assert!(!controller.policy().cooldown_active);
    assert_eq!(controller.policy().active_market, "GBP/USD");

    match controller.complete(&ticket, Ok(signal("GBP/USD", "b"))) {
        Completion::Stored(stored) => assert_eq!(stored.market, "GBP/USD"),
        other => panic!("unexpected completion: {:?}", other),
    }
}

#[test]
fn test_stale_result_is_discarded() {
    let mut controller = SignalRefreshController::new("EUR/USD OTC", &RefreshConfig::default());
    let stale = controller.request(Trigger::Manual).unwrap();
    let current = controller.set_market("USD/JPY").unwrap();

    assert_eq!(
        controller.complete(&stale, Ok(signal("EUR/USD OTC", "late"))),
        Completion::Discarded
    );
    assert_eq!(controller.history_len(), 0);
    assert_eq!(controller.state(), RefreshState::Generating);

    assert!(matches!(
        controller.complete(&current, Ok(signal("USD/JPY", "fresh"))),
        Completion::Stored(_)
    ));
    assert_eq!(controller.latest().map(|s| s.id.as_str()), Some("fresh"));
}

#[test]
fn test_failures_back_off_then_exhaust() {
    let config = RefreshConfig {
        max_retries: 2,
        ..RefreshConfig::default()
    };
    let mut controller = SignalRefreshController::new("EUR/USD OTC", &config);

    let ticket = controller.request(Trigger::Manual).unwrap();
    assert_eq!(
        controller.complete(&ticket, Err(failure())),
        Completion::RetryIn(Duration::from_secs(5))
    );
    assert_eq!(controller.state(), RefreshState::Idle);
    assert!(controller.last_error().is_some());

    let ticket = controller.request(Trigger::Retry).unwrap();
    assert!(controller.last_error().is_none());
    assert_eq!(
        controller.complete(&ticket, Err(failure())),
        Completion::RetryIn(Duration::from_secs(10))
    );

    let ticket = controller.request(Trigger::Retry).unwrap();
    assert_eq!(
        controller.complete(&ticket, Err(failure())),
        Completion::Exhausted
    );
    assert_eq!(controller.state(), RefreshState::Exhausted);

    assert_eq!(
        controller.request(Trigger::AutoRefresh),
        Err(TriggerRejected::Exhausted)
    );
    assert_eq!(
        controller.request(Trigger::Retry),
        Err(TriggerRejected::Exhausted)
    );

    // a manual trigger starts over
    let ticket = controller.request(Trigger::Manual).unwrap();
    assert_eq!(
        controller.complete(&ticket, Err(failure())),
        Completion::RetryIn(Duration::from_secs(5))
    );
}

#[test]
fn test_success_resets_failure_count() {
    let mut controller = SignalRefreshController::new(
        "EUR/USD OTC",
        &RefreshConfig {
            cooldown_secs: 0,
            ..RefreshConfig::default()
        },
    );

    let ticket = controller.request(Trigger::Manual).unwrap();
    controller.complete(&ticket, Err(failure()));
    let ticket = controller.request(Trigger::Retry).unwrap();
    controller.complete(&ticket, Ok(signal("EUR/USD OTC", "ok")));
    assert_eq!(controller.state(), RefreshState::Idle);

    let ticket = controller.request(Trigger::Manual).unwrap();
    assert_eq!(
        controller.complete(&ticket, Err(failure())),
        Completion::RetryIn(Duration::from_secs(5))
    );
}

#[test]
fn test_cooldown_ticks_down_to_idle() {
    let mut controller = SignalRefreshController::new(
        "AUD/USD OTC",
        &RefreshConfig {
            cooldown_secs: 3,
            ..RefreshConfig::default()
        },
    );
    let ticket = controller.request(Trigger::Manual).unwrap();
    controller.complete(&ticket, Ok(signal("AUD/USD OTC", "a")));

    controller.tick();
    assert_eq!(
        controller.state(),
        RefreshState::Cooldown {
            seconds_remaining: 2
        }
    );
    controller.tick();
    controller.tick();
    assert_eq!(controller.state(), RefreshState::Idle);

    // idle ticks are no-ops
    controller.tick();
    assert_eq!(controller.state(), RefreshState::Idle);
    assert_ok!(controller.request(Trigger::AutoRefresh));
}

#[test]
fn test_auto_refresh_respects_toggle() {
    let mut controller = SignalRefreshController::new("EUR/USD", &RefreshConfig::default());
    controller.set_auto_refresh(false);

    assert_eq!(
        controller.request(Trigger::AutoRefresh),
        Err(TriggerRejected::AutoRefreshDisabled)
    );
    let ticket = assert_ok!(controller.request(Trigger::Manual));
    assert_eq!(ticket.trigger, Trigger::Manual);
    assert_err!(controller.request(Trigger::Manual));
}

#[test]
fn test_history_is_capped_newest_first() {
    let mut controller = SignalRefreshController::new(
        "EUR/USD",
        &RefreshConfig {
            cooldown_secs: 0,
            history_limit: 2,
            ..RefreshConfig::default()
        },
    );

    for id in ["one", "two", "three"] {
        let ticket = controller.request(Trigger::Manual).unwrap();
        controller.complete(&ticket, Ok(signal("EUR/USD", id)));
    }

    let ids: Vec<&str> = controller.history().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["three", "two"]);
}

#[test]
fn test_stored_signal_carries_session_timeframe() {
    let mut controller = SignalRefreshController::new("EUR/USD", &RefreshConfig::default());
    controller.set_timeframe(Timeframe::FiveMinutes);

    let ticket = controller.request(Trigger::Manual).unwrap();
    controller.complete(&ticket, Ok(signal("EUR/USD", "a")));

    assert_eq!(
        controller.latest().and_then(|s| s.timeframe),
        Some(Timeframe::FiveMinutes)
    );
}

#[test]
fn test_view_serialization() {
    let mut controller = SignalRefreshController::new("EUR/USD", &RefreshConfig::default());
    let ticket = controller.request(Trigger::Manual).unwrap();
    controller.complete(&ticket, Ok(signal("EUR/USD", "a")));

    let json = serde_json::to_value(controller.view()).unwrap();
    assert_eq!(json["state"]["state"], "cooldown");
    assert_eq!(json["state"]["secondsRemaining"], 60);
    assert_eq!(json["policy"]["cooldownActive"], true);
    assert_eq!(json["policy"]["activeMarket"], "EUR/USD");
    assert_eq!(json["policy"]["timeframe"], "1m");
    assert_eq!(json["history"][0]["timeframe"], "1m");
    assert!(json.get("error").is_none());
}
