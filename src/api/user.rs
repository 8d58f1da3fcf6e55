//! Local user endpoints.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::ApiResponse;
use crate::error::Result;
use crate::types::StoredUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(current_user))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// The signed-in local user, or `null`.
async fn current_user(State(state): State<AppState>) -> Json<ApiResponse<Option<StoredUser>>> {
    Json(ApiResponse::new(state.identity.current()))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<StoredUser>>> {
    let user = state
        .identity
        .login(&request.email, request.name.as_deref())?;
    Ok(Json(ApiResponse::new(user)))
}

async fn logout(State(state): State<AppState>) -> Json<ApiResponse<Option<StoredUser>>> {
    state.identity.logout();
    Json(ApiResponse::new(None))
}
