use crate::api::error::AppError;
use crate::entity::{EntityRecord, ServiceCall};
use crate::upstream::UpstreamHub;
use axum::{
    body::Bytes,
    extract::State,
    response::Json,
    routing::post,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Shared state for the hub proxy endpoints
#[derive(Clone)]
pub struct ProxyAppState {
    pub hub: Arc<dyn UpstreamHub>,
}

/// Success response for service calls
#[derive(Serialize)]
struct ServiceResponse {
    success: bool,
}

/// Create router with the two proxied hub operations
pub fn create_proxy_router(state: ProxyAppState) -> Router {
    Router::new()
        .route("/api/states", post(list_states))
        .route("/api/service", post(call_service))
        .with_state(Arc::new(state))
}

/// POST /api/states - Full entity snapshot from the hub
async fn list_states(
    State(state): State<Arc<ProxyAppState>>,
) -> Result<Json<Vec<EntityRecord>>, AppError> {
    let states = state.hub.list_states().await.map_err(|e| {
        error!(error = %e, "HA API error while listing states");
        AppError::StatesUnavailable
    })?;

    Ok(Json(states))
}

/// POST /api/service - Forward {domain, service, serviceData} to the hub
async fn call_service(
    State(state): State<Arc<ProxyAppState>>,
    body: Bytes,
) -> Result<Json<ServiceResponse>, AppError> {
    let call: ServiceCall = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    call.validate().map_err(AppError::ValidationError)?;

    info!(
        domain = %call.domain,
        service = %call.service,
        "Forwarding service call"
    );

    state.hub.call_service(&call).await.map_err(|e| {
        error!(
            error = %e,
            domain = %call.domain,
            service = %call.service,
            "HA API error while calling service"
        );
        AppError::ServiceCallFailed
    })?;

    Ok(Json(ServiceResponse { success: true }))
}
