// Upstream automation hub integration

mod client;

pub use client::HubClient;

use crate::entity::{EntityRecord, ServiceCall};
use anyhow::Result;
use async_trait::async_trait;

/// The two hub operations the proxy forwards.
///
/// Failures are returned as-is; callers decide how to surface them. No retries
/// and no caching happen at this layer.
#[async_trait]
pub trait UpstreamHub: Send + Sync {
    /// Fetch the full entity snapshot
    async fn list_states(&self) -> Result<Vec<EntityRecord>>;

    /// Invoke `{domain}.{service}` with the call's payload
    async fn call_service(&self, call: &ServiceCall) -> Result<()>;
}
