use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::{Credentials, Timeframe};

/// Market data simulation configuration.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Age after which a cached snapshot is regenerated.
    pub snapshot_ttl: Duration,
    /// Interval of the background refresh of all catalog symbols.
    pub refresh_interval: Duration,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            snapshot_ttl: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(30),
        }
    }
}

/// Authentication retry configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Credentials used for the eager login and every retry.
    pub credentials: Credentials,
    /// Delay of the one-shot retry after a failed login.
    pub retry_delay: Duration,
    /// Maximum consecutive retries before giving up until the next explicit attempt.
    pub max_retries: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::new("demo@signaldesk.local", "demo"),
            retry_delay: Duration::from_secs(3),
            max_retries: 5,
        }
    }
}

/// Signal refresh session configuration.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Lockout after a stored signal (seconds).
    pub cooldown_secs: u32,
    /// Interval of the auto-refresh timer.
    pub auto_refresh_interval: Duration,
    /// Whether auto refresh starts enabled.
    pub auto_refresh_enabled: bool,
    /// First retry delay after a failed generation.
    pub retry_base_delay: Duration,
    /// Upper bound for the backoff delay.
    pub retry_max_delay: Duration,
    /// Failed generations tolerated before the session gives up.
    pub max_retries: u32,
    /// Number of signals kept in the session history.
    pub history_limit: usize,
    /// Timeframe stamped on stored signals until the client picks one.
    pub default_timeframe: Timeframe,
    /// Market the session starts on.
    pub default_market: String,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 60,
            auto_refresh_interval: Duration::from_secs(60),
            auto_refresh_enabled: true,
            retry_base_delay: Duration::from_secs(5),
            retry_max_delay: Duration::from_secs(80),
            max_retries: 5,
            history_limit: 100,
            default_timeframe: Timeframe::default(),
            default_market: "USD/BRL OTC".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Directory of the local key-value store. `None` keeps everything in memory.
    pub store_dir: Option<PathBuf>,
    /// Seed for the shared random source. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
    pub market: MarketConfig,
    pub auth: AuthConfig,
    pub refresh: RefreshConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            store_dir: None,
            rng_seed: None,
            market: MarketConfig::default(),
            auth: AuthConfig::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let credentials = Credentials::new(
            env::var("QUOTEX_EMAIL").unwrap_or(defaults.auth.credentials.email),
            env::var("QUOTEX_PASSWORD").unwrap_or(defaults.auth.credentials.password),
        );

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            store_dir: Some(
                env::var("SIGNALDESK_STORE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(".signaldesk")),
            ),
            rng_seed: parse_var("SIGNALDESK_RNG_SEED"),
            market: MarketConfig {
                snapshot_ttl: secs_var("SNAPSHOT_TTL_SECS").unwrap_or(defaults.market.snapshot_ttl),
                refresh_interval: secs_var("DATA_REFRESH_SECS")
                    .unwrap_or(defaults.market.refresh_interval),
            },
            auth: AuthConfig {
                credentials,
                retry_delay: secs_var("AUTH_RETRY_DELAY_SECS").unwrap_or(defaults.auth.retry_delay),
                max_retries: parse_var("AUTH_MAX_RETRIES").unwrap_or(defaults.auth.max_retries),
            },
            refresh: RefreshConfig {
                cooldown_secs: parse_var("SIGNAL_COOLDOWN_SECS")
                    .unwrap_or(defaults.refresh.cooldown_secs),
                auto_refresh_interval: secs_var("AUTO_REFRESH_SECS")
                    .unwrap_or(defaults.refresh.auto_refresh_interval),
                auto_refresh_enabled: env::var("AUTO_REFRESH_ENABLED")
                    .ok()
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(defaults.refresh.auto_refresh_enabled),
                retry_base_delay: secs_var("SIGNAL_RETRY_DELAY_SECS")
                    .unwrap_or(defaults.refresh.retry_base_delay),
                retry_max_delay: secs_var("SIGNAL_RETRY_MAX_DELAY_SECS")
                    .unwrap_or(defaults.refresh.retry_max_delay),
                max_retries: parse_var("SIGNAL_MAX_RETRIES").unwrap_or(defaults.refresh.max_retries),
                history_limit: parse_var("SIGNAL_HISTORY_LIMIT")
                    .unwrap_or(defaults.refresh.history_limit),
                default_timeframe: env::var("DEFAULT_TIMEFRAME")
                    .ok()
                    .and_then(|v| Timeframe::from_str(&v))
                    .unwrap_or(defaults.refresh.default_timeframe),
                default_market: env::var("DEFAULT_MARKET")
                    .unwrap_or(defaults.refresh.default_market),
            },
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn secs_var(name: &str) -> Option<Duration> {
    parse_var::<u64>(name).map(Duration::from_secs)
}
