pub mod auth;
pub mod market;
pub mod refresh;
pub mod settings;
pub mod signals;

pub use auth::*;
pub use market::*;
pub use refresh::*;
pub use settings::*;
pub use signals::*;
