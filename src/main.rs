use anyhow::{Context, Result};
use rtouch::api::{create_app, ProxyAppState, WebhookAppState};
use rtouch::config::{self, ProxyEnv};
use rtouch::upstream::HubClient;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rtouch=info,tower_http=info".into()),
        )
        .init();

    info!("RTOUCH proxy starting...");

    let mut config = config::load_from_env().context("Failed to load configuration")?;
    config.apply_env_overrides();
    let env = ProxyEnv::from_env();

    info!(
        port = config.server.port,
        upstream = %config.upstream.base_url,
        static_dir = %config.server.static_dir.display(),
        timeout_seconds = config.upstream.request_timeout_seconds,
        "Configuration loaded"
    );

    let hub = HubClient::from_config(&config.upstream, env.supervisor_token.clone())
        .context("Failed to initialize hub client")?;

    let router = create_app(
        ProxyAppState { hub: Arc::new(hub) },
        WebhookAppState {
            webhook_secret: env.webhook_secret.clone(),
        },
        &config.server.static_dir,
    );

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.server.port))
        .await
        .context("Failed to bind server port")?;
    info!(port = config.server.port, "RTOUCH server running");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl_c signal");
            }
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    info!("RTOUCH proxy stopped");
    Ok(())
}
