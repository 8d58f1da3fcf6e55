//! Market catalog and snapshot endpoints.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use super::ApiResponse;
use crate::error::Result;
use crate::types::{MarketDescriptor, MarketSnapshot};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_markets))
        .route("/:symbol", get(get_snapshot))
}

/// List the market catalog.
async fn list_markets(State(state): State<AppState>) -> Json<ApiResponse<Vec<MarketDescriptor>>> {
    Json(ApiResponse::new(state.market_data.list_markets()))
}

/// Current snapshot for a symbol ("EURUSD" or "eurusd").
async fn get_snapshot(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<MarketSnapshot>>> {
    let snapshot = state.market_data.get_snapshot(&symbol.trim().to_uppercase())?;
    Ok(Json(ApiResponse::new(snapshot)))
}
