//! SignalDesk - trading signal service over simulated OTC market data

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

use axum::Router;
use config::Config;
use services::{
    AuthSession, Authenticator, Entropy, LocalIdentity, LocalStore, MarketDataSimulator,
    SettingsService, SignalGenerator, SignalSession, SimulatedAuthenticator,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: AuthSession,
    pub market_data: Arc<MarketDataSimulator>,
    pub generator: Arc<SignalGenerator>,
    pub session: Arc<SignalSession>,
    pub settings: SettingsService,
    pub identity: LocalIdentity,
}

impl AppState {
    /// Wire up all services. Nothing runs until [`AppState::start`].
    pub fn new(
        config: Config,
        backend: Arc<dyn Authenticator>,
        store: LocalStore,
        entropy: Entropy,
    ) -> Self {
        let auth = AuthSession::new(backend, &config.auth);
        let market_data = MarketDataSimulator::new(auth.clone(), entropy.clone(), &config.market);
        let generator = SignalGenerator::new(market_data.clone(), entropy);
        let session = SignalSession::new(
            config.refresh.default_market.clone(),
            generator.clone(),
            auth.clone(),
            &config.refresh,
        );

        Self {
            config: Arc::new(config),
            auth,
            market_data,
            generator,
            session,
            settings: SettingsService::new(store.clone()),
            identity: LocalIdentity::new(store),
        }
    }

    /// Build the state from configuration with the simulated backend.
    pub fn from_config(config: Config) -> error::Result<Self> {
        let store = match &config.store_dir {
            Some(dir) => LocalStore::open(dir)?,
            None => LocalStore::in_memory(),
        };
        let entropy = Entropy::from_seed(config.rng_seed);
        Ok(Self::new(config, Arc::new(SimulatedAuthenticator), store, entropy))
    }

    /// Log in, prime market data and start all timers.
    pub async fn start(&self) {
        self.market_data.start().await;
        self.session.start();
        info!("Services started");
    }

    pub fn stop(&self) {
        self.session.stop();
        self.market_data.stop();
        info!("Services stopped");
    }
}

/// Build the HTTP application.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
