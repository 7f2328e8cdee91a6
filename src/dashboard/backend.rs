use crate::entity::{EntityRecord, ServiceCall};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Data source the dashboard store polls and commands
#[async_trait]
pub trait DashboardBackend: Send + Sync {
    async fn fetch_states(&self) -> Result<Vec<EntityRecord>>;

    async fn call_service(&self, call: &ServiceCall) -> Result<()>;
}

/// HTTP client for the RTOUCH proxy
pub struct ProxyClient {
    http_client: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent("rtouch-panel/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DashboardBackend for ProxyClient {
    async fn fetch_states(&self) -> Result<Vec<EntityRecord>> {
        let url = format!("{}/api/states", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .send()
            .await
            .context("Failed to reach proxy")?;

        if !response.status().is_success() {
            return Err(anyhow!("Proxy states error: {}", response.status()));
        }

        let records = response
            .json::<Vec<EntityRecord>>()
            .await
            .context("Failed to parse proxy states response")?;
        debug!(count = records.len(), "Fetched states from proxy");
        Ok(records)
    }

    async fn call_service(&self, call: &ServiceCall) -> Result<()> {
        let url = format!("{}/api/service", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(call)
            .send()
            .await
            .context("Failed to reach proxy")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Proxy rejected {}.{}: {}",
                call.domain,
                call.service,
                response.status()
            ));
        }
        Ok(())
    }
}
