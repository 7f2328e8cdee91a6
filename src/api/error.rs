use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Application error types
///
/// Upstream failures are reported with fixed messages; the underlying cause is
/// only logged.
#[derive(Debug)]
pub enum AppError {
    /// Request body is not structurally valid
    ValidationError(String),
    /// Hub state listing failed
    StatesUnavailable,
    /// Hub service call failed
    ServiceCallFailed,
    /// Webhook signature missing, malformed or wrong
    InvalidSignature,
    /// Webhook secret absent from the process environment
    WebhookSecretMissing,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::StatesUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch HA data".to_string(),
            ),
            AppError::ServiceCallFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to call service".to_string(),
            ),
            AppError::InvalidSignature => {
                (StatusCode::UNAUTHORIZED, "Invalid signature".to_string())
            }
            AppError::WebhookSecretMissing => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Webhook secret not configured".to_string(),
            ),
        };
        let body = Json(ErrorResponse {
            error: error_message,
        });
        (status, body).into_response()
    }
}
