//! Per-session signal refresh state machine.
//!
//! Decides when a new signal may be generated: manual and auto-refresh
//! triggers, the cooldown lockout after each stored signal, bounded retries
//! after failures and the reset on market change. Purely synchronous; the
//! timers live in [`crate::services::SignalSession`].

use crate::config::RefreshConfig;
use crate::error::AppError;
use crate::types::{
    Completion, RefreshPolicy, RefreshState, SessionView, Signal, Timeframe, Trigger,
    TriggerRejected,
};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bounded exponential backoff for failed generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl From<&RefreshConfig> for RetryPolicy {
    fn from(config: &RefreshConfig) -> Self {
        Self {
            base_delay: config.retry_base_delay,
            max_delay: config.retry_max_delay,
            max_attempts: config.max_retries,
        }
    }
}

/// Permission to run one generation, tagged with the market it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub id: u64,
    pub market: String,
    pub trigger: Trigger,
}

/// Refresh state machine for one client session.
#[derive(Debug)]
pub struct SignalRefreshController {
    state: RefreshState,
    active_market: String,
    timeframe: Timeframe,
    auto_refresh: bool,
    /// Newest first.
    history: VecDeque<Signal>,
    history_limit: usize,
    last_updated: Option<i64>,
    last_error: Option<String>,
    cooldown_secs: u32,
    retry: RetryPolicy,
    /// Consecutive failed generations.
    failures: u32,
    next_ticket: u64,
    in_flight: Option<u64>,
}

impl SignalRefreshController {
    /// Create an idle controller for a market.
    pub fn new(active_market: impl Into<String>, config: &RefreshConfig) -> Self {
        Self {
            state: RefreshState::Idle,
            active_market: active_market.into(),
            timeframe: config.default_timeframe,
            auto_refresh: config.auto_refresh_enabled,
            history: VecDeque::new(),
            history_limit: config.history_limit.max(1),
            last_updated: None,
            last_error: None,
            cooldown_secs: config.cooldown_secs,
            retry: RetryPolicy::from(config),
            failures: 0,
            next_ticket: 0,
            in_flight: None,
        }
    }

    /// Ask to generate a signal for the active market.
    pub fn request(&mut self, trigger: Trigger) -> Result<GenerationTicket, TriggerRejected> {
        if trigger == Trigger::Retry {
            self.last_error = None;
        }

        match self.state {
            RefreshState::Generating => return Err(TriggerRejected::InFlight),
            RefreshState::Cooldown { seconds_remaining } => {
                return Err(TriggerRejected::CoolingDown { seconds_remaining })
            }
            RefreshState::Exhausted if trigger != Trigger::Manual => {
                return Err(TriggerRejected::Exhausted)
            }
            RefreshState::Exhausted => {
                self.failures = 0;
                self.last_error = None;
            }
            RefreshState::Idle => {}
        }

        if trigger == Trigger::AutoRefresh && !self.auto_refresh {
            return Err(TriggerRejected::AutoRefreshDisabled);
        }

        Ok(self.issue(trigger))
    }

    /// Hand back the result of a generation.
    pub fn complete(
        &mut self,
        ticket: &GenerationTicket,
        result: Result<Signal, AppError>,
    ) -> Completion {
        if self.in_flight != Some(ticket.id) || ticket.market != self.active_market {
            debug!(
                "Discarding result of request {} for {} (active: {})",
                ticket.id, ticket.market, self.active_market
            );
            return Completion::Discarded;
        }
        self.in_flight = None;

        match result {
            Ok(signal) => {
                let signal = signal.with_timeframe(self.timeframe);
                self.history.push_front(signal.clone());
                self.history.truncate(self.history_limit);
                self.last_updated = Some(chrono::Utc::now().timestamp_millis());
                self.last_error = None;
                self.failures = 0;
                self.state = if self.cooldown_secs > 0 {
                    RefreshState::Cooldown {
                        seconds_remaining: self.cooldown_secs,
                    }
                } else {
                    RefreshState::Idle
                };
                Completion::Stored(signal)
            }
            Err(e) => {
                warn!("Error generating signal for {}: {}", ticket.market, e);
                self.last_error = Some(e.to_string());
                self.failures += 1;

                if self.failures > self.retry.max_attempts {
                    warn!(
                        "Giving up on {} after {} failed attempts",
                        ticket.market, self.failures
                    );
                    self.state = RefreshState::Exhausted;
                    Completion::Exhausted
                } else {
                    self.state = RefreshState::Idle;
                    Completion::RetryIn(self.retry.delay_for(self.failures))
                }
            }
        }
    }

    /// Advance the cooldown by one second.
    pub fn tick(&mut self) {
        if let RefreshState::Cooldown { seconds_remaining } = self.state {
            self.state = if seconds_remaining > 1 {
                RefreshState::Cooldown {
                    seconds_remaining: seconds_remaining - 1,
                }
            } else {
                RefreshState::Idle
            };
        }
    }

    /// Switch markets. Clears the session and starts generating for the new
    /// market at once, whatever the current state. Returns `None` if the
    /// market is unchanged.
    pub fn set_market(&mut self, market: impl Into<String>) -> Option<GenerationTicket> {
        let market = market.into();
        if market == self.active_market {
            return None;
        }

        info!("Active market changed: {} -> {}", self.active_market, market);
        self.active_market = market;
        self.history.clear();
        self.last_error = None;
        self.failures = 0;
        Some(self.issue(Trigger::MarketChange))
    }

    pub fn set_timeframe(&mut self, timeframe: Timeframe) {
        self.timeframe = timeframe;
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn active_market(&self) -> &str {
        &self.active_market
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn auto_refresh_enabled(&self) -> bool {
        self.auto_refresh
    }

    pub fn is_cooling_down(&self) -> bool {
        matches!(self.state, RefreshState::Cooldown { .. })
    }

    pub fn cooldown_remaining(&self) -> u32 {
        match self.state {
            RefreshState::Cooldown { seconds_remaining } => seconds_remaining,
            _ => 0,
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &Signal> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Most recent signal.
    pub fn latest(&self) -> Option<&Signal> {
        self.history.front()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_updated(&self) -> Option<i64> {
        self.last_updated
    }

    pub fn policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            cooldown_active: self.is_cooling_down(),
            cooldown_seconds_remaining: self.cooldown_remaining(),
            auto_refresh_enabled: self.auto_refresh,
            active_market: self.active_market.clone(),
            timeframe: self.timeframe,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            state: self.state,
            policy: self.policy(),
            history: self.history.iter().cloned().collect(),
            last_updated: self.last_updated,
            error: self.last_error.clone(),
        }
    }

    fn issue(&mut self, trigger: Trigger) -> GenerationTicket {
        self.next_ticket += 1;
        self.in_flight = Some(self.next_ticket);
        self.state = RefreshState::Generating;
        debug!(
            "Issued request {} ({:?}) for {}",
            self.next_ticket, trigger, self.active_market
        );
        GenerationTicket {
            id: self.next_ticket,
            market: self.active_market.clone(),
            trigger,
        }
    }
}
