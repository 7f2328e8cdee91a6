// HTTP surface of the proxy

mod error;
pub mod proxy;
pub mod webhook;

pub use error::AppError;
pub use proxy::{create_proxy_router, ProxyAppState};
pub use webhook::{create_webhook_router, WebhookAppState};

use axum::Router;
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Full application router.
///
/// API and webhook routes take precedence; every other path is served from the
/// single-page app directory, falling back to its index.html so client-side
/// routes resolve.
pub fn create_app(proxy: ProxyAppState, webhook: WebhookAppState, static_dir: &Path) -> Router {
    create_proxy_router(proxy)
        .merge(create_webhook_router(webhook))
        .fallback_service(app_shell(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn app_shell(static_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")))
}
