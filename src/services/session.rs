//! Async driver for a signal refresh session.
//!
//! Owns the timers around [`SignalRefreshController`]: the auto-refresh
//! interval, the backoff retry after a failed generation and the cooldown
//! countdown. The countdown is anchored to the moment a signal is stored, so
//! a cooldown of N seconds lasts N whole seconds.

use crate::config::RefreshConfig;
use crate::error::{AppError, Result};
use crate::services::{AuthSession, GenerationTicket, SignalGenerator, SignalRefreshController};
use crate::types::{Completion, SessionView, Signal, Timeframe, Trigger, TriggerRejected};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// One client's signal refresh session.
pub struct SignalSession {
    controller: Mutex<SignalRefreshController>,
    generator: Arc<SignalGenerator>,
    auth: AuthSession,
    auto_refresh_interval: Duration,
    /// Auto-refresh timer and the initial generation.
    timers: Mutex<Vec<JoinHandle<()>>>,
    countdown: Mutex<Option<JoinHandle<()>>>,
    pending_retry: Mutex<Option<JoinHandle<()>>>,
}

impl SignalSession {
    /// Create a session for a market. Timers start with [`SignalSession::start`].
    pub fn new(
        market: impl Into<String>,
        generator: Arc<SignalGenerator>,
        auth: AuthSession,
        config: &RefreshConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            controller: Mutex::new(SignalRefreshController::new(market, config)),
            generator,
            auth,
            auto_refresh_interval: config.auto_refresh_interval,
            timers: Mutex::new(Vec::new()),
            countdown: Mutex::new(None),
            pending_retry: Mutex::new(None),
        })
    }

    /// Manually request a signal.
    pub async fn trigger(self: &Arc<Self>) -> std::result::Result<Completion, TriggerRejected> {
        self.run(Trigger::Manual).await
    }

    /// Switch the active market and generate for it immediately.
    /// Returns `None` when the market did not change.
    pub async fn change_market(self: &Arc<Self>, market: &str) -> Option<Completion> {
        let ticket = self.controller().set_market(market)?;
        self.cancel_retry();
        Some(self.dispatch(ticket).await)
    }

    pub fn set_timeframe(&self, timeframe: Timeframe) {
        self.controller().set_timeframe(timeframe);
    }

    pub fn set_auto_refresh(&self, enabled: bool) {
        self.controller().set_auto_refresh(enabled);
        info!("Auto refresh {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn view(&self) -> SessionView {
        self.controller().view()
    }

    pub fn latest(&self) -> Option<Signal> {
        self.controller().latest().cloned()
    }

    /// Start the auto-refresh timer and generate the first signal for the
    /// active market.
    pub fn start(self: &Arc<Self>) {
        let auto_refresh = {
            let session = self.clone();
            let period = self.auto_refresh_interval;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    if session.controller().is_cooling_down() {
                        continue;
                    }
                    match session.run(Trigger::AutoRefresh).await {
                        Ok(completion) => debug!("Auto refresh: {:?}", completion),
                        Err(rejected) => debug!("Auto refresh skipped: {}", rejected),
                    }
                }
            })
        };

        let initial = {
            let session = self.clone();
            tokio::spawn(async move {
                if let Err(rejected) = session.run(Trigger::Manual).await {
                    debug!("Initial signal skipped: {}", rejected);
                }
            })
        };

        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in timers.drain(..) {
            handle.abort();
        }
        timers.extend([auto_refresh, initial]);
        info!(
            "Signal session started for {}",
            self.controller().active_market()
        );
    }

    /// Stop all timers, the cooldown countdown and any scheduled retry.
    pub fn stop(&self) {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in timers.drain(..) {
            handle.abort();
        }
        drop(timers);
        self.cancel_countdown();
        self.cancel_retry();
        info!("Signal session stopped");
    }

    async fn run(
        self: &Arc<Self>,
        trigger: Trigger,
    ) -> std::result::Result<Completion, TriggerRejected> {
        let ticket = self.controller().request(trigger)?;
        Ok(self.dispatch(ticket).await)
    }

    async fn dispatch(self: &Arc<Self>, ticket: GenerationTicket) -> Completion {
        info!(
            "Generating signal for market: {} ({:?})",
            ticket.market, ticket.trigger
        );
        let result = self.produce(&ticket.market).await;

        let completion = {
            let mut controller = self.controller();
            controller.complete(&ticket, result)
        };

        match &completion {
            Completion::Stored(_) => self.start_countdown(),
            Completion::RetryIn(delay) => self.schedule_retry(*delay),
            _ => {}
        }
        completion
    }

    async fn produce(&self, market: &str) -> Result<Signal> {
        if !self.auth.ensure_authenticated().await {
            return Err(AppError::SignalGeneration(
                "Authentication failed. Please try again.".into(),
            ));
        }
        self.generator.generate(market)
    }

    /// Tick the cooldown once per second, starting one second after the
    /// signal was stored. Replaces any countdown already running.
    fn start_countdown(self: &Arc<Self>) {
        let session = self.clone();
        let handle = tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let cooling_down = {
                    let mut controller = session.controller();
                    controller.tick();
                    controller.is_cooling_down()
                };
                if !cooling_down {
                    break;
                }
            }
        });

        let mut countdown = self.countdown.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = countdown.replace(handle) {
            previous.abort();
        }
    }

    fn cancel_countdown(&self) {
        let mut countdown = self.countdown.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = countdown.take() {
            handle.abort();
        }
    }

    fn schedule_retry(self: &Arc<Self>, delay: Duration) {
        info!("Retrying signal generation in {:?}", delay);
        let session = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(rejected) = session.run(Trigger::Retry).await {
                warn!("Signal retry skipped: {}", rejected);
            }
        });

        let mut pending = self.pending_retry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    fn cancel_retry(&self) {
        let mut pending = self.pending_retry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    fn controller(&self) -> MutexGuard<'_, SignalRefreshController> {
        self.controller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
