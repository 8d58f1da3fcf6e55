//! Market data backend session endpoints.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::types::{AuthStatus, Credentials};
use crate::AppState;

/// Logout response.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(status))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

async fn status(State(state): State<AppState>) -> Json<ApiResponse<AuthStatus>> {
    Json(ApiResponse::new(AuthStatus::from(&state.auth.state())))
}

/// Log in with explicit credentials. A failure also schedules a retry with the
/// configured credentials.
async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<ApiResponse<AuthStatus>>> {
    if !state.auth.authenticate(&credentials).await {
        return Err(AppError::AuthFailed("invalid credentials".into()));
    }
    if let Err(e) = state.market_data.refresh_all() {
        tracing::warn!("Market data refresh after login failed: {}", e);
    }
    Ok(Json(ApiResponse::new(AuthStatus::from(&state.auth.state()))))
}

async fn logout(State(state): State<AppState>) -> Json<ApiResponse<LogoutResponse>> {
    state.auth.sign_out();
    Json(ApiResponse::new(LogoutResponse { success: true }))
}
