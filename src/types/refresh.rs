//! Types of the per-session signal refresh state machine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{Signal, Timeframe};

/// State of a refresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RefreshState {
    Idle,
    Generating,
    #[serde(rename_all = "camelCase")]
    Cooldown { seconds_remaining: u32 },
    /// Retries used up. Left only by a manual trigger or a market change.
    Exhausted,
}

/// What asked for a new signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Manual,
    AutoRefresh,
    MarketChange,
    Retry,
}

/// Why a trigger was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum TriggerRejected {
    #[error("a signal is already being generated")]
    InFlight,
    #[error("cooldown active, {seconds_remaining}s remaining")]
    #[serde(rename_all = "camelCase")]
    CoolingDown { seconds_remaining: u32 },
    #[error("auto refresh is disabled")]
    AutoRefreshDisabled,
    #[error("retries exhausted, trigger manually")]
    Exhausted,
}

/// Result of handing a generation result back to the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "camelCase")]
pub enum Completion {
    /// Signal prepended to history.
    Stored(Signal),
    /// Result belonged to a superseded request and was dropped.
    Discarded,
    /// Generation failed, a retry follows after the delay.
    #[serde(serialize_with = "serialize_delay")]
    RetryIn(Duration),
    /// Generation failed and no retries remain.
    Exhausted,
}

fn serialize_delay<S: serde::Serializer>(delay: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(delay.as_millis() as u64)
}

/// Refresh settings visible to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPolicy {
    pub cooldown_active: bool,
    pub cooldown_seconds_remaining: u32,
    pub auto_refresh_enabled: bool,
    pub active_market: String,
    pub timeframe: Timeframe,
}

/// Snapshot of a refresh session for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub state: RefreshState,
    pub policy: RefreshPolicy,
    /// Newest first.
    pub history: Vec<Signal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
