use super::detect::{Role, RoleMapping};
use super::tiles::TileOrder;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::warn;

/// Key holding the persisted role mapping
pub const ROLE_MAPPING_KEY: &str = "rtouch-entities";

/// Key holding the persisted tile order
pub const TILE_ORDER_KEY: &str = "rtouch-tile-order";

/// Small string key-value persistence for dashboard preferences
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let value = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(value))
    }

    /// Atomic write: temp file, fsync, rename.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).context("Failed to create storage directory")?;

        let path = self.path_for(key);
        let tmp_path = path.with_extension("tmp");
        {
            let mut file =
                File::create(&tmp_path).context("Failed to create temporary storage file")?;
            file.write_all(value.as_bytes())
                .context("Failed to write storage value")?;
            file.sync_all()
                .context("Failed to sync storage file to disk")?;
        }

        fs::rename(&tmp_path, &path).context("Failed to rename temporary storage file")?;
        Ok(())
    }
}

/// In-process store for tests and ephemeral panels
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().expect("memory store lock poisoned");
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().expect("memory store lock poisoned");
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persisted role mapping, or the defaults when absent or unreadable
pub fn load_role_mapping(store: &dyn KeyValueStore) -> RoleMapping {
    match store.get(ROLE_MAPPING_KEY) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!(error = %e, "Stored role mapping is corrupt, using defaults");
                RoleMapping::default()
            }
        },
        Ok(None) => RoleMapping::default(),
        Err(e) => {
            warn!(error = %e, "Failed to read role mapping, using defaults");
            RoleMapping::default()
        }
    }
}

pub fn save_role_mapping(store: &dyn KeyValueStore, mapping: &RoleMapping) -> Result<()> {
    let raw = serde_json::to_string(mapping).context("Failed to serialize role mapping")?;
    store.set(ROLE_MAPPING_KEY, &raw)
}

/// Persisted tile order, or the initial order when absent or not a permutation
pub fn load_tile_order(store: &dyn KeyValueStore) -> TileOrder {
    let raw = match store.get(TILE_ORDER_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return TileOrder::default(),
        Err(e) => {
            warn!(error = %e, "Failed to read tile order, using default");
            return TileOrder::default();
        }
    };

    serde_json::from_str::<Vec<Role>>(&raw)
        .ok()
        .and_then(TileOrder::from_roles)
        .unwrap_or_else(|| {
            warn!(stored = %raw, "Stored tile order is invalid, using default");
            TileOrder::default()
        })
}

pub fn save_tile_order(store: &dyn KeyValueStore, order: &TileOrder) -> Result<()> {
    let raw = serde_json::to_string(order.roles()).context("Failed to serialize tile order")?;
    store.set(TILE_ORDER_KEY, &raw)
}
