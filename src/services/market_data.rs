//! Synthetic market data for the static OTC catalog.
//!
//! Snapshots are generated around a fixed base price per symbol and cached
//! until they age past the freshness window. Access requires an authenticated
//! [`AuthSession`].

use crate::config::MarketConfig;
use crate::error::{AppError, Result};
use crate::services::{AuthSession, Entropy};
use crate::types::{MarketDescriptor, MarketSnapshot};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Catalog of (symbol, display name), in display order.
pub const MARKET_CATALOG: [(&str, &str); 11] = [
    ("USDBRL", "USD/BRL OTC"),
    ("USDINR", "USD/INR OTC"),
    ("EURUSD", "EUR/USD OTC"),
    ("USDJPY", "USD/JPY OTC"),
    ("USDCAD", "USD/CAD OTC"),
    ("AUDUSD", "AUD/USD OTC"),
    ("CHFJPY", "CHF/JPY OTC"),
    ("EURUSD", "EUR/USD"),
    ("GBPUSD", "GBP/USD"),
    ("CADCHF", "CAD/CHF"),
    ("USDJPY", "USD/JPY"),
];

/// Base price for symbols missing from the table.
pub const DEFAULT_BASE_PRICE: f64 = 100.0;

/// Reference price a symbol's synthetic data is generated around.
pub fn base_price(symbol: &str) -> f64 {
    match symbol {
        "USDBRL" => 5.05,
        "USDINR" => 83.45,
        "EURUSD" => 1.08,
        "USDJPY" => 150.5,
        "USDCAD" => 1.36,
        "AUDUSD" => 0.65,
        "CHFJPY" => 170.25,
        "GBPUSD" => 1.27,
        "CADCHF" => 0.64,
        _ => DEFAULT_BASE_PRICE,
    }
}

/// Cached snapshot with its generation instant.
#[derive(Debug, Clone)]
struct CachedSnapshot {
    snapshot: MarketSnapshot,
    fetched_at: Instant,
}

impl CachedSnapshot {
    fn fresh(snapshot: MarketSnapshot) -> Self {
        Self {
            snapshot,
            fetched_at: Instant::now(),
        }
    }
}

/// Market data simulator with a per-symbol snapshot cache.
pub struct MarketDataSimulator {
    auth: AuthSession,
    entropy: Entropy,
    /// Snapshots keyed by symbol.
    cache: DashMap<String, CachedSnapshot>,
    snapshot_ttl: Duration,
    refresh_interval: Duration,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl MarketDataSimulator {
    /// Create a new simulator.
    pub fn new(auth: AuthSession, entropy: Entropy, config: &MarketConfig) -> Arc<Self> {
        Arc::new(Self {
            auth,
            entropy,
            cache: DashMap::new(),
            snapshot_ttl: config.snapshot_ttl,
            refresh_interval: config.refresh_interval,
            refresh_task: Mutex::new(None),
        })
    }

    /// The static market catalog.
    pub fn list_markets(&self) -> Vec<MarketDescriptor> {
        MARKET_CATALOG
            .iter()
            .map(|(symbol, name)| MarketDescriptor::new(symbol, name))
            .collect()
    }

    /// Session gating access to market data.
    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// Get the snapshot for a symbol, regenerating it if missing or stale.
    pub fn get_snapshot(&self, symbol: &str) -> Result<MarketSnapshot> {
        self.auth.require()?;

        // The shard stays locked from the freshness check to the insert, so
        // concurrent readers of a stale symbol all see the same regeneration.
        match self.cache.entry(symbol.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().fetched_at.elapsed() <= self.snapshot_ttl {
                    return Ok(entry.get().snapshot.clone());
                }
                let snapshot = self.synthesize(symbol)?;
                entry.insert(CachedSnapshot::fresh(snapshot.clone()));
                Ok(snapshot)
            }
            Entry::Vacant(entry) => {
                let snapshot = self.synthesize(symbol)?;
                entry.insert(CachedSnapshot::fresh(snapshot.clone()));
                Ok(snapshot)
            }
        }
    }

    /// Cached snapshot for a symbol without freshness checks or regeneration.
    pub fn peek(&self, symbol: &str) -> Option<MarketSnapshot> {
        self.cache.get(symbol).map(|c| c.snapshot.clone())
    }

    /// Seed the cache with a snapshot, treated as freshly generated.
    pub fn insert_snapshot(&self, snapshot: MarketSnapshot) {
        self.cache
            .insert(snapshot.symbol.clone(), CachedSnapshot::fresh(snapshot));
    }

    /// Regenerate snapshots for every catalog symbol.
    pub fn refresh_all(&self) -> Result<usize> {
        self.auth.require()?;

        let mut refreshed = 0;
        for (symbol, _) in MARKET_CATALOG.iter() {
            match self.regenerate(symbol) {
                Ok(_) => refreshed += 1,
                Err(e) => warn!("Error refreshing market data for {}: {}", symbol, e),
            }
        }
        debug!("Updated market data for {} symbols", refreshed);
        Ok(refreshed)
    }

    /// Log in and start the periodic refresh.
    pub async fn start(self: &Arc<Self>) {
        if self.auth.authenticate_default().await {
            if let Err(e) = self.refresh_all() {
                warn!("Initial market data refresh failed: {}", e);
            }
        } else {
            warn!("Initial authentication failed, will retry");
        }

        let simulator = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(simulator.refresh_interval);
            interval.tick().await;
            loop {
                interval.tick().await;
                simulator.refresh_cycle().await;
            }
        });

        let mut task = self.refresh_task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = task.replace(handle) {
            previous.abort();
        }
        info!(
            "Market data refresh started (every {:?})",
            self.refresh_interval
        );
    }

    /// Stop the periodic refresh and any pending login retry.
    pub fn stop(&self) {
        let mut task = self.refresh_task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = task.take() {
            handle.abort();
            info!("Market data refresh stopped");
        }
        self.auth.shutdown();
    }

    async fn refresh_cycle(&self) {
        if !self.auth.is_authenticated() {
            info!("Not authenticated, attempting to re-authenticate");
            if !self.auth.ensure_authenticated().await {
                warn!("Re-authentication failed, skipping market data refresh");
                return;
            }
        }
        if let Err(e) = self.refresh_all() {
            warn!("Market data refresh failed: {}", e);
        }
    }

    fn regenerate(&self, symbol: &str) -> Result<MarketSnapshot> {
        let snapshot = self.synthesize(symbol)?;
        self.insert_snapshot(snapshot.clone());
        Ok(snapshot)
    }

    fn synthesize(&self, symbol: &str) -> Result<MarketSnapshot> {
        if symbol.trim().is_empty() {
            return Err(AppError::DataFetch {
                symbol: symbol.to_string(),
                reason: "empty symbol".into(),
            });
        }

        let base = base_price(symbol);
        let change = (self.entropy.uniform() * 0.02 - 0.01) * base;
        let high = base + self.entropy.uniform() * 0.02 * base;
        let low = base - self.entropy.uniform() * 0.02 * base;
        let volume = (self.entropy.uniform() * 10_000.0).floor() as u64;

        Ok(MarketSnapshot {
            symbol: symbol.to_string(),
            price: base + change,
            change,
            change_percent: change / base * 100.0,
            high,
            low,
            volume,
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
    }
}
