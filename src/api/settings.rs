//! Signal settings endpoints.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use super::ApiResponse;
use crate::error::Result;
use crate::types::{PartialSignalSettings, SignalSettings};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_settings).put(replace_settings).patch(update_settings),
        )
        .route("/reset", post(reset_settings))
}

async fn get_settings(State(state): State<AppState>) -> Json<ApiResponse<SignalSettings>> {
    Json(ApiResponse::new(state.settings.load()))
}

async fn replace_settings(
    State(state): State<AppState>,
    Json(settings): Json<SignalSettings>,
) -> Result<Json<ApiResponse<SignalSettings>>> {
    state.settings.save(&settings)?;
    Ok(Json(ApiResponse::new(settings)))
}

async fn update_settings(
    State(state): State<AppState>,
    Json(partial): Json<PartialSignalSettings>,
) -> Result<Json<ApiResponse<SignalSettings>>> {
    let settings = state.settings.update(&partial)?;
    Ok(Json(ApiResponse::new(settings)))
}

async fn reset_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SignalSettings>>> {
    let settings = state.settings.reset()?;
    Ok(Json(ApiResponse::new(settings)))
}
