pub mod auth;
pub mod health;
pub mod markets;
pub mod session;
pub mod settings;
pub mod signals;
pub mod user;

use crate::AppState;
use axum::Router;
use serde::Serialize;

/// API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/markets", markets::router())
        .nest("/api/signals", signals::router())
        .nest("/api/session", session::router())
        .nest("/api/auth", auth::router())
        .nest("/api/settings", settings::router())
        .nest("/api/user", user::router())
}
