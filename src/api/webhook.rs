use crate::api::error::AppError;
use crate::signature::{extract_signature, verify_signature};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::post,
    Router,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared state for the webhook endpoint
#[derive(Clone)]
pub struct WebhookAppState {
    /// Shared secret; None means the endpoint is not configured
    pub webhook_secret: Option<String>,
}

/// Webhook acknowledgement
#[derive(Serialize)]
struct WebhookResponse {
    received: bool,
}

pub fn create_webhook_router(state: WebhookAppState) -> Router {
    Router::new()
        .route("/webhook", post(receive_webhook))
        .with_state(Arc::new(state))
}

/// POST /webhook - Accept a signed event
///
/// The raw body is verified before any parsing.
async fn receive_webhook(
    State(state): State<Arc<WebhookAppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, AppError> {
    let secret = state.webhook_secret.as_deref().unwrap_or_default();

    if let Err(e) = verify_signature(&body, secret, extract_signature(&headers)) {
        if e.is_configuration_error() {
            error!("Webhook received but no secret is configured");
            return Err(AppError::WebhookSecretMissing);
        }
        warn!(reason = %e, "Rejected webhook");
        return Err(AppError::InvalidSignature);
    }

    let payload = parse_payload(&body);
    info!(
        bytes = body.len(),
        fields = payload.as_object().map(Map::len).unwrap_or(0),
        "Received verified webhook event"
    );

    Ok(Json(WebhookResponse { received: true }))
}

/// Parse a verified body; anything that is not JSON becomes an empty object.
pub fn parse_payload(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(Map::new()))
}
