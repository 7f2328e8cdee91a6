use super::UpstreamHub;
use crate::config::UpstreamConfig;
use crate::entity::{EntityRecord, ServiceCall};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::debug;

/// HTTP client for the hub REST API.
///
/// Injects the bearer credential on every request and applies a fixed request
/// timeout, so a hung hub surfaces as an error instead of a stalled handler.
pub struct HubClient {
    token: Option<String>,
    http_client: Client,
    base_url: String,
}

impl HubClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent("rtouch/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            token,
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &UpstreamConfig, token: Option<String>) -> Result<Self> {
        Self::new(config.base_url.clone(), token, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl UpstreamHub for HubClient {
    async fn list_states(&self) -> Result<Vec<EntityRecord>> {
        let url = format!("{}/states", self.base_url);
        let response = self
            .authorize(self.http_client.get(&url))
            .send()
            .await
            .context("Failed to send list_states request")?;

        check_response_status(&response)?;
        let records = response
            .json::<Vec<EntityRecord>>()
            .await
            .context("Failed to parse states response")?;

        debug!(count = records.len(), "Fetched entity states from hub");
        Ok(records)
    }

    async fn call_service(&self, call: &ServiceCall) -> Result<()> {
        call.validate().map_err(|e| anyhow!(e))?;
        let url = format!("{}/services/{}/{}", self.base_url, call.domain, call.service);
        let response = self
            .authorize(self.http_client.post(&url))
            .json(&call.service_data)
            .send()
            .await
            .with_context(|| {
                format!("Failed to send {}.{} service call", call.domain, call.service)
            })?;

        check_response_status(&response)?;
        debug!(domain = %call.domain, service = %call.service, "Hub service call accepted");
        Ok(())
    }
}

/// Map non-2xx hub responses to descriptive errors.
fn check_response_status(response: &reqwest::Response) -> Result<()> {
    match response.status() {
        StatusCode::UNAUTHORIZED => Err(anyhow!("Hub auth error: token missing or invalid")),
        StatusCode::NOT_FOUND => Err(anyhow!(
            "Hub endpoint not found: {}",
            response.url().path()
        )),
        s if !s.is_success() => Err(anyhow!("Hub API error: {}", s)),
        _ => Ok(()),
    }
}
