//! Signal refresh session endpoints.

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::types::{Completion, SessionView, Timeframe};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MarketRequest {
    pub market: String,
}

#[derive(Debug, Deserialize)]
pub struct TimeframeRequest {
    pub timeframe: Timeframe,
}

#[derive(Debug, Deserialize)]
pub struct AutoRefreshRequest {
    pub enabled: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_session))
        .route("/trigger", post(trigger))
        .route("/market", put(change_market))
        .route("/timeframe", put(set_timeframe))
        .route("/auto-refresh", put(set_auto_refresh))
}

async fn get_session(State(state): State<AppState>) -> Json<ApiResponse<SessionView>> {
    Json(ApiResponse::new(state.session.view()))
}

/// Manually request a signal. Refused while generating or cooling down.
async fn trigger(State(state): State<AppState>) -> Result<Json<ApiResponse<Completion>>> {
    let completion = state
        .session
        .trigger()
        .await
        .map_err(|rejected| AppError::Throttled(rejected.to_string()))?;
    Ok(Json(ApiResponse::new(completion)))
}

/// Switch markets and generate for the new one right away.
async fn change_market(
    State(state): State<AppState>,
    Json(request): Json<MarketRequest>,
) -> Result<Json<ApiResponse<SessionView>>> {
    let market = request.market.trim();
    if market.is_empty() {
        return Err(AppError::BadRequest("market is required".into()));
    }
    state.session.change_market(market).await;
    Ok(Json(ApiResponse::new(state.session.view())))
}

async fn set_timeframe(
    State(state): State<AppState>,
    Json(request): Json<TimeframeRequest>,
) -> Json<ApiResponse<SessionView>> {
    state.session.set_timeframe(request.timeframe);
    Json(ApiResponse::new(state.session.view()))
}

async fn set_auto_refresh(
    State(state): State<AppState>,
    Json(request): Json<AutoRefreshRequest>,
) -> Json<ApiResponse<SessionView>> {
    state.session.set_auto_refresh(request.enabled);
    Json(ApiResponse::new(state.session.view()))
}
