use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Failed to fetch market data for {symbol}: {reason}")]
    DataFetch { symbol: String, reason: String },

    #[error("Failed to generate signal: {0}")]
    SignalGeneration(String),

    #[error("Signal request rejected: {0}")]
    Throttled(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotAuthenticated | AppError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            AppError::DataFetch { .. } => StatusCode::BAD_GATEWAY,
            AppError::SignalGeneration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Throttled(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::SerdeJson(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
