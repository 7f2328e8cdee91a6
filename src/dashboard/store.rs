use super::backend::DashboardBackend;
use super::detect::{detect_entities, RoleMapping};
use super::storage::{self, KeyValueStore};
use super::tiles::TileOrder;
use crate::entity::{EntityRecord, ServiceCall};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[cfg(test)]
mod tests;

/// Floor applied to the polling period; tokio intervals reject zero
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No snapshot received yet
    Loading,
    /// At least one fetch succeeded
    Ready,
}

/// Point-in-time view of store health
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStatus {
    pub phase: Phase,
    pub entity_count: usize,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

struct StoreState {
    phase: Phase,
    entities: HashMap<String, EntityRecord>,
    mapping: RoleMapping,
    tile_order: TileOrder,
    last_refresh: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Client-side cache of the hub snapshot.
///
/// Each successful refresh replaces the snapshot wholesale. Refreshes may
/// overlap (polling tick vs. post-action refresh); whichever write lands last
/// wins.
pub struct PollingStore {
    backend: Arc<dyn DashboardBackend>,
    storage: Arc<dyn KeyValueStore>,
    refresh_delay: Duration,
    state: RwLock<StoreState>,
}

impl PollingStore {
    /// Seeds the role mapping and tile order from persisted storage.
    pub fn new(
        backend: Arc<dyn DashboardBackend>,
        storage: Arc<dyn KeyValueStore>,
        refresh_delay: Duration,
    ) -> Self {
        let mapping = storage::load_role_mapping(storage.as_ref());
        let tile_order = storage::load_tile_order(storage.as_ref());

        Self {
            backend,
            storage,
            refresh_delay,
            state: RwLock::new(StoreState {
                phase: Phase::Loading,
                entities: HashMap::new(),
                mapping,
                tile_order,
                last_refresh: None,
                last_error: None,
            }),
        }
    }

    /// Fetch a fresh snapshot. Failures are logged and leave the prior state intact.
    pub async fn refresh(&self) {
        if let Err(e) = self.try_refresh().await {
            error!(error = %e, "Failed to refresh entity states");
            let mut state = self.state.write().expect("store lock poisoned");
            state.last_error = Some(e.to_string());
        }
    }

    async fn try_refresh(&self) -> Result<()> {
        let records = self.backend.fetch_states().await?;
        let entities: HashMap<String, EntityRecord> = records
            .into_iter()
            .map(|r| (r.entity_id.clone(), r))
            .collect();
        let count = entities.len();

        // Persist under the write lock so overlapping refreshes reach storage
        // in the same order they update memory.
        let mut state = self.state.write().expect("store lock poisoned");
        let detected = detect_entities(&entities, &state.mapping);
        if detected.differs_from(&state.mapping) {
            info!(
                audio = %detected.audio,
                alarm = %detected.alarm,
                light = %detected.light,
                climate = %detected.climate,
                "Role mapping updated"
            );
            if let Err(e) = storage::save_role_mapping(self.storage.as_ref(), &detected) {
                warn!(error = %e, "Failed to persist role mapping");
            }
            state.mapping = detected;
        }

        state.entities = entities;
        state.phase = Phase::Ready;
        state.last_refresh = Some(Utc::now());
        state.last_error = None;
        drop(state);

        debug!(entity_count = count, "Entity snapshot refreshed");
        Ok(())
    }

    /// Issue a service call, then refresh once after the refresh delay.
    ///
    /// The call's outcome is logged, never returned. The returned handle
    /// completes when the follow-up refresh has finished.
    pub async fn dispatch(self: &Arc<Self>, call: ServiceCall) -> JoinHandle<()> {
        match self.backend.call_service(&call).await {
            Ok(()) => debug!(domain = %call.domain, service = %call.service, "Service call sent"),
            Err(e) => error!(
                domain = %call.domain,
                service = %call.service,
                error = %e,
                "Service call failed"
            ),
        }

        let store = Arc::clone(self);
        let delay = self.refresh_delay;
        tokio::spawn(async move {
            sleep(delay).await;
            store.refresh().await;
        })
    }

    /// Cached record, or an `unavailable` placeholder for unknown ids
    pub fn get_entity(&self, entity_id: &str) -> EntityRecord {
        let state = self.state.read().expect("store lock poisoned");
        state
            .entities
            .get(entity_id)
            .cloned()
            .unwrap_or_else(|| EntityRecord::unavailable(entity_id))
    }

    pub fn role_mapping(&self) -> RoleMapping {
        self.state.read().expect("store lock poisoned").mapping.clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.read().expect("store lock poisoned").phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::Loading
    }

    pub fn tile_order(&self) -> TileOrder {
        self.state.read().expect("store lock poisoned").tile_order.clone()
    }

    /// Replace the tile order and persist it; persistence failures are logged.
    pub fn set_tile_order(&self, order: TileOrder) {
        {
            let mut state = self.state.write().expect("store lock poisoned");
            state.tile_order = order.clone();
        }
        if let Err(e) = storage::save_tile_order(self.storage.as_ref(), &order) {
            warn!(error = %e, "Failed to persist tile order");
        }
    }

    pub fn status(&self) -> StoreStatus {
        let state = self.state.read().expect("store lock poisoned");
        StoreStatus {
            phase: state.phase,
            entity_count: state.entities.len(),
            last_refresh: state.last_refresh,
            last_error: state.last_error.clone(),
        }
    }
}

/// Handle to a running polling task. Dropping it stops the polling.
pub struct PollingHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollingHandle {
    /// Stop scheduling refreshes; an in-flight refresh still completes.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the polling task to exit
    pub async fn join(mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Refresh immediately, then every `every`, until `token` is cancelled.
///
/// Periods below [`MIN_POLL_INTERVAL`] are raised to it.
///
/// Ticks are serial: a slow refresh delays the next tick rather than
/// overlapping it.
pub fn spawn_polling(
    store: Arc<PollingStore>,
    every: Duration,
    token: CancellationToken,
) -> PollingHandle {
    let every = every.max(MIN_POLL_INTERVAL);
    let task_token = token.clone();
    let task = tokio::spawn(async move {
        info!(interval_ms = every.as_millis() as u64, "Starting state polling");

        let mut timer = interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = task_token.cancelled() => break,
                _ = timer.tick() => store.refresh().await,
            }
        }

        info!("State polling stopped");
    });

    PollingHandle {
        token,
        task: Some(task),
    }
}
