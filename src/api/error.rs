use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::services::SemsError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("SEMS credentials are not configured")]
    NotConfigured,
    #[error(transparent)]
    Sems(#[from] SemsError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotConfigured => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            ApiError::Sems(SemsError::Auth(msg)) => {
                tracing::warn!(reason = %msg, "SEMS login rejected");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ApiError::Sems(e) => {
                tracing::error!(error = %e, "SEMS call failed");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            ApiError::Internal(e) => {
                tracing::error!(error = ?e, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
