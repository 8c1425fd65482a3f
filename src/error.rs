//! Marketplace error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Not authenticated")]
    Unauthorized,

    /// Deliberately covers "account not found" as well, so callers cannot
    /// enumerate registered emails.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Email already registered")]
    Conflict,

    #[error("Unknown listing status")]
    InvalidStatus,

    #[error("Operation not permitted by domain rules")]
    InvalidOperation,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            MarketError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not authenticated"),
            MarketError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            MarketError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            MarketError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            MarketError::Conflict => (StatusCode::CONFLICT, "Email already registered"),
            MarketError::InvalidStatus => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Unknown listing status")
            }
            MarketError::InvalidOperation => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Operation not permitted by domain rules",
            ),
            MarketError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            MarketError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}
