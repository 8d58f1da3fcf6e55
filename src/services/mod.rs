pub mod auth;
pub mod identity;
pub mod local_store;
pub mod market_data;
pub mod random;
pub mod refresh;
pub mod session;
pub mod settings;
pub mod signals;

pub use auth::{AuthSession, Authenticator, SimulatedAuthenticator};
pub use identity::LocalIdentity;
pub use local_store::LocalStore;
pub use market_data::MarketDataSimulator;
pub use random::{Entropy, RandomSource, SequenceSource};
pub use refresh::{GenerationTicket, RetryPolicy, SignalRefreshController};
pub use session::SignalSession;
pub use settings::SettingsService;
pub use signals::{symbol_for_market, SignalGenerator};
