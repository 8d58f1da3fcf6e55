use super::ApiResponse;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    authenticated: bool,
}

async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::new(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        authenticated: state.auth.is_authenticated(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}
