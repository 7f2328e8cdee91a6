use super::*;
use crate::dashboard::detect::Role;
use crate::dashboard::storage::{MemoryStore, ROLE_MAPPING_KEY, TILE_ORDER_KEY};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One scripted answer to `fetch_states`; `None` states means failure
struct Scripted {
    delay: Duration,
    states: Option<Vec<EntityRecord>>,
}

/// Backend answering from a script, then from `fallback` once the script runs out
#[derive(Default)]
struct FakeBackend {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Vec<EntityRecord>,
    fail_calls: bool,
    fetches: AtomicUsize,
    calls: Mutex<Vec<ServiceCall>>,
}

impl FakeBackend {
    fn with_states(states: Vec<EntityRecord>) -> Self {
        Self {
            fallback: states,
            ..Default::default()
        }
    }

    fn push(&self, delay: Duration, states: Option<Vec<EntityRecord>>) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted { delay, states });
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DashboardBackend for FakeBackend {
    async fn fetch_states(&self) -> Result<Vec<EntityRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let (delay, states) = match next {
            Some(s) => (s.delay, s.states),
            None => (Duration::ZERO, Some(self.fallback.clone())),
        };
        if !delay.is_zero() {
            sleep(delay).await;
        }
        states.ok_or_else(|| anyhow!("proxy unreachable"))
    }

    async fn call_service(&self, call: &ServiceCall) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        if self.fail_calls {
            return Err(anyhow!("proxy returned 500"));
        }
        Ok(())
    }
}

/// Key-value store counting writes, optionally failing them
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
    fail_writes: bool,
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(anyhow!("disk full"));
        }
        self.inner.set(key, value)
    }
}

fn light(state: &str) -> EntityRecord {
    EntityRecord::new("light.lutron_caseta_dimmer", state).with_attribute("brightness", 255)
}

fn store_with(backend: Arc<FakeBackend>) -> Arc<PollingStore> {
    Arc::new(PollingStore::new(
        backend,
        Arc::new(MemoryStore::new()),
        Duration::from_millis(250),
    ))
}

#[tokio::test]
async fn test_new_store_is_loading() {
    let store = store_with(Arc::new(FakeBackend::default()));

    assert_eq!(store.phase(), Phase::Loading);
    assert!(store.is_loading());
    assert_eq!(store.role_mapping(), RoleMapping::default());
    assert_eq!(store.tile_order(), TileOrder::default());

    let status = store.status();
    assert_eq!(status.entity_count, 0);
    assert!(status.last_refresh.is_none());
}

#[tokio::test]
async fn test_get_entity_unknown_is_unavailable() {
    let store = store_with(Arc::new(FakeBackend::default()));

    let entity = store.get_entity("light.nowhere");
    assert_eq!(entity.entity_id, "light.nowhere");
    assert_eq!(entity.state, "unavailable");
    assert!(entity.attributes.is_empty());
}

#[tokio::test]
async fn test_refresh_success_becomes_ready() {
    let backend = Arc::new(FakeBackend::with_states(vec![light("on")]));
    let store = store_with(backend.clone());

    store.refresh().await;

    assert_eq!(store.phase(), Phase::Ready);
    assert_eq!(store.get_entity("light.lutron_caseta_dimmer").state, "on");
    let status = store.status();
    assert_eq!(status.entity_count, 1);
    assert!(status.last_refresh.is_some());
    assert!(status.last_error.is_none());
}

#[tokio::test]
async fn test_refresh_failure_keeps_loading() {
    let backend = Arc::new(FakeBackend::default());
    backend.push(Duration::ZERO, None);
    let store = store_with(backend.clone());

    store.refresh().await;

    assert_eq!(store.phase(), Phase::Loading);
    assert!(store.status().last_error.is_some());
}

#[tokio::test]
async fn test_refresh_failure_keeps_last_snapshot() {
    let backend = Arc::new(FakeBackend::default());
    backend.push(Duration::ZERO, Some(vec![light("on")]));
    backend.push(Duration::ZERO, None);
    let store = store_with(backend.clone());

    store.refresh().await;
    let first_refresh = store.status().last_refresh;
    store.refresh().await;

    assert_eq!(store.phase(), Phase::Ready);
    assert_eq!(store.get_entity("light.lutron_caseta_dimmer").state, "on");
    let status = store.status();
    assert_eq!(status.last_refresh, first_refresh);
    assert!(status.last_error.unwrap().contains("unreachable"));
}

#[tokio::test]
async fn test_refresh_replaces_snapshot_wholesale() {
    let backend = Arc::new(FakeBackend::default());
    backend.push(
        Duration::ZERO,
        Some(vec![light("on"), EntityRecord::new("sensor.door", "closed")]),
    );
    backend.push(Duration::ZERO, Some(vec![light("off")]));
    let store = store_with(backend.clone());

    store.refresh().await;
    assert_eq!(store.get_entity("sensor.door").state, "closed");

    store.refresh().await;
    assert_eq!(store.get_entity("sensor.door").state, "unavailable");
    assert_eq!(store.get_entity("light.lutron_caseta_dimmer").state, "off");
}

#[tokio::test]
async fn test_detection_updates_and_persists_mapping() {
    let backend = Arc::new(FakeBackend::with_states(vec![EntityRecord::new(
        "climate.upstairs",
        "heat",
    )
    .with_attribute("friendly_name", "Ecobee Upstairs")]));
    let kv = Arc::new(CountingStore::default());
    let store = PollingStore::new(backend, kv.clone(), Duration::from_millis(250));

    store.refresh().await;
    assert_eq!(store.role_mapping().climate, "climate.upstairs");
    assert_eq!(kv.writes.load(Ordering::SeqCst), 1);

    let raw = kv.get(ROLE_MAPPING_KEY).unwrap().unwrap();
    assert!(raw.contains("climate.upstairs"));

    // Same snapshot again: mapping unchanged, nothing written
    store.refresh().await;
    assert_eq!(kv.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_mapping_persist_failure_is_swallowed() {
    let backend = Arc::new(FakeBackend::with_states(vec![EntityRecord::new(
        "alarm_control_panel.garage",
        "disarmed",
    )]));
    let kv = Arc::new(CountingStore {
        fail_writes: true,
        ..Default::default()
    });
    let store = PollingStore::new(backend, kv.clone(), Duration::from_millis(250));

    store.refresh().await;

    assert_eq!(store.phase(), Phase::Ready);
    assert_eq!(store.role_mapping().alarm, "alarm_control_panel.garage");
    assert_eq!(kv.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_seeds_from_persisted_preferences() {
    let kv = Arc::new(MemoryStore::new());
    kv.set(ROLE_MAPPING_KEY, r#"{"SONY": "media_player.den"}"#)
        .unwrap();
    kv.set(TILE_ORDER_KEY, r#"["alarm","sony","ecobee","caseta"]"#)
        .unwrap();

    let store = PollingStore::new(
        Arc::new(FakeBackend::default()),
        kv,
        Duration::from_millis(250),
    );

    assert_eq!(store.role_mapping().audio, "media_player.den");
    assert_eq!(store.role_mapping().light, RoleMapping::default().light);
    assert_eq!(
        store.tile_order().roles(),
        &[Role::Alarm, Role::Audio, Role::Climate, Role::Light]
    );
}

#[tokio::test]
async fn test_set_tile_order_persists() {
    let kv = Arc::new(MemoryStore::new());
    let store = PollingStore::new(
        Arc::new(FakeBackend::default()),
        kv.clone(),
        Duration::from_millis(250),
    );

    let mut order = store.tile_order();
    assert!(order.reorder(Role::Audio, Role::Light));
    store.set_tile_order(order.clone());

    assert_eq!(store.tile_order(), order);
    assert_eq!(storage::load_tile_order(kv.as_ref()), order);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_refreshes_once_after_delay() {
    let backend = Arc::new(FakeBackend::with_states(vec![light("on")]));
    let store = store_with(backend.clone());

    let call = ServiceCall::for_entity("light", "toggle", "light.lutron_caseta_dimmer");
    let handle = store.dispatch(call.clone()).await;

    assert_eq!(backend.calls.lock().unwrap().as_slice(), &[call]);
    sleep(Duration::from_millis(249)).await;
    assert_eq!(backend.fetch_count(), 0);

    handle.await.unwrap();
    assert_eq!(backend.fetch_count(), 1);
    assert_eq!(store.phase(), Phase::Ready);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_failure_still_refreshes() {
    let backend = Arc::new(FakeBackend {
        fail_calls: true,
        fallback: vec![light("off")],
        ..Default::default()
    });
    let store = store_with(backend.clone());

    let handle = store
        .dispatch(ServiceCall::for_entity("light", "toggle", "light.x"))
        .await;
    handle.await.unwrap();

    assert_eq!(backend.calls.lock().unwrap().len(), 1);
    assert_eq!(backend.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_polling_refreshes_on_interval() {
    let backend = Arc::new(FakeBackend::with_states(vec![light("on")]));
    let store = store_with(backend.clone());

    let handle = spawn_polling(store.clone(), Duration::from_secs(3), CancellationToken::new());

    // Ticks at 0s, 3s and 6s
    sleep(Duration::from_millis(6100)).await;
    assert_eq!(backend.fetch_count(), 3);
    assert_eq!(store.phase(), Phase::Ready);

    handle.cancel();
    assert!(handle.is_cancelled());
    handle.join().await.unwrap();

    sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.fetch_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_polling_keeps_going_after_failures() {
    let backend = Arc::new(FakeBackend::with_states(vec![light("on")]));
    backend.push(Duration::ZERO, None);
    backend.push(Duration::ZERO, None);
    let store = store_with(backend.clone());

    let handle = spawn_polling(store.clone(), Duration::from_secs(3), CancellationToken::new());

    sleep(Duration::from_millis(3100)).await;
    assert_eq!(backend.fetch_count(), 2);
    assert!(store.is_loading());

    sleep(Duration::from_secs(3)).await;
    assert_eq!(backend.fetch_count(), 3);
    assert!(!store.is_loading());

    handle.cancel();
    handle.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_polling() {
    let backend = Arc::new(FakeBackend::default());
    let store = store_with(backend.clone());
    let token = CancellationToken::new();

    let handle = spawn_polling(store, Duration::from_secs(3), token.clone());
    sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.fetch_count(), 1);

    drop(handle);
    assert!(token.is_cancelled());

    sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_lets_in_flight_refresh_finish() {
    let backend = Arc::new(FakeBackend::default());
    backend.push(Duration::from_secs(1), Some(vec![light("on")]));
    let store = store_with(backend.clone());

    let handle = spawn_polling(store.clone(), Duration::from_secs(3), CancellationToken::new());
    sleep(Duration::from_millis(500)).await;
    assert!(store.is_loading());

    handle.cancel();
    handle.join().await.unwrap();

    assert_eq!(store.phase(), Phase::Ready);
    assert_eq!(backend.fetch_count(), 1);
}

/// Overlapping refreshes are not sequenced: the response that lands last
/// overwrites the snapshot, even if it was requested first.
#[tokio::test(start_paused = true)]
async fn test_overlapping_refreshes_last_writer_wins() {
    let backend = Arc::new(FakeBackend::default());
    backend.push(Duration::from_millis(500), Some(vec![light("on")]));
    backend.push(Duration::from_millis(10), Some(vec![light("off")]));
    let store = store_with(backend.clone());

    let slow = {
        let store = store.clone();
        tokio::spawn(async move { store.refresh().await })
    };
    tokio::task::yield_now().await;
    let fast = {
        let store = store.clone();
        tokio::spawn(async move { store.refresh().await })
    };

    fast.await.unwrap();
    assert_eq!(store.get_entity("light.lutron_caseta_dimmer").state, "off");

    slow.await.unwrap();
    assert_eq!(store.get_entity("light.lutron_caseta_dimmer").state, "on");
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_mapping_changes_persist_in_landing_order() {
    let climate = |id: &str| EntityRecord::new(id, "heat");
    let backend = Arc::new(FakeBackend::default());
    backend.push(Duration::from_millis(500), Some(vec![climate("climate.upstairs")]));
    backend.push(Duration::from_millis(10), Some(vec![climate("climate.downstairs")]));
    let kv = Arc::new(CountingStore::default());
    let store = Arc::new(PollingStore::new(
        backend,
        kv.clone(),
        Duration::from_millis(250),
    ));

    let slow = {
        let store = store.clone();
        tokio::spawn(async move { store.refresh().await })
    };
    tokio::task::yield_now().await;
    let fast = {
        let store = store.clone();
        tokio::spawn(async move { store.refresh().await })
    };
    fast.await.unwrap();
    slow.await.unwrap();

    assert_eq!(store.role_mapping().climate, "climate.upstairs");
    assert_eq!(storage::load_role_mapping(kv.as_ref()), store.role_mapping());
    assert_eq!(kv.writes.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_zero_poll_interval_is_clamped() {
    let backend = Arc::new(FakeBackend::with_states(vec![light("on")]));
    let store = store_with(backend.clone());

    let handle = spawn_polling(store.clone(), Duration::ZERO, CancellationToken::new());
    sleep(Duration::from_millis(10)).await;

    assert!(backend.fetch_count() >= 2);
    assert_eq!(store.phase(), Phase::Ready);

    handle.cancel();
    handle.join().await.unwrap();
}
