//! Direct signal generation, outside any refresh session.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::types::Signal;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub market: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(generate))
}

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<Signal>>> {
    if request.market.trim().is_empty() {
        return Err(AppError::BadRequest("market is required".into()));
    }
    let signal = state.generator.generate(&request.market)?;
    Ok(Json(ApiResponse::new(signal)))
}
