//! Local key-value persistence for per-zone settings.
//!
//! The browser build of the dashboard kept per-zone style overrides and
//! the legacy active-flag fallback in `localStorage`. Here that side
//! table is an explicit injected `KvStore`, so the session logic carries
//! no hidden global state and tests run against `MemoryStore`. The
//! native implementation is a JSON file under the user config directory.
//!
//! Nothing in these stores is synced to the backend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{ACTIVE_OVERRIDES_KEY, STYLE_KEY_PREFIX};
use crate::style::StyleConfig;

/// String key-value store, the shape of browser `localStorage`.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// File-backed store: one JSON object per file, written back on every
/// mutation. Write failures are logged and swallowed; losing a style
/// override must never take down an edit session.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct JsonFileStore {
    path: std::path::PathBuf,
    entries: HashMap<String, String>,
}

#[cfg(not(target_arch = "wasm32"))]
impl JsonFileStore {
    /// Open a store at the given path, loading existing entries if the
    /// file is present and parseable.
    pub fn open(path: impl Into<std::path::PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(map) => map,
                Err(e) => {
                    log::warn!("Ignoring malformed store file {:?}: {}", path, e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    /// Default store location: `<config_dir>/zoneedit/overrides.json`.
    pub fn default_path() -> Option<std::path::PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("zoneedit").join("overrides.json"))
        } else {
            dirs::home_dir().map(|home| home.join(".config").join("zoneedit").join("overrides.json"))
        }
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("Failed to create store directory {:?}: {}", parent, e);
                return;
            }
        }
        match serde_json::to_string_pretty(&self.entries) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    log::warn!("Failed to write store file {:?}: {}", self.path, e);
                }
            }
            Err(e) => log::warn!("Failed to encode store file {:?}: {}", self.path, e),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist();
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.persist();
        }
    }
}

/// Typed access to per-zone style overrides.
///
/// One entry per zone, keyed `zone_style_<id>`, holding a `StyleConfig`
/// as JSON. An override is used verbatim when present; absence means
/// "derive the default".
pub struct StyleOverrides;

impl StyleOverrides {
    fn key(zone_id: u64) -> String {
        format!("{STYLE_KEY_PREFIX}{zone_id}")
    }

    pub fn load(store: &dyn KvStore, zone_id: u64) -> Option<StyleConfig> {
        let raw = store.get(&Self::key(zone_id))?;
        match serde_json::from_str(&raw) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                log::warn!("Ignoring malformed style override for zone {}: {}", zone_id, e);
                None
            }
        }
    }

    pub fn save(store: &mut dyn KvStore, zone_id: u64, style: &StyleConfig) {
        match serde_json::to_string(style) {
            Ok(json) => store.set(&Self::key(zone_id), &json),
            Err(e) => log::warn!("Failed to encode style override for zone {}: {}", zone_id, e),
        }
    }

    pub fn clear(store: &mut dyn KvStore, zone_id: u64) {
        store.remove(&Self::key(zone_id));
    }
}

/// Legacy active-flag fallback.
///
/// Older backend deployments do not serve `is_active` on the zone list;
/// until they do, the toggle lives in a local override map under a
/// single key. A backend-provided flag always wins over the local one.
pub struct ActiveOverrides;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ActiveMap(HashMap<u64, bool>);

impl ActiveOverrides {
    fn read(store: &dyn KvStore) -> ActiveMap {
        let Some(raw) = store.get(ACTIVE_OVERRIDES_KEY) else {
            return ActiveMap::default();
        };
        match serde_json::from_str(&raw) {
            Ok(map) => ActiveMap(map),
            Err(e) => {
                log::warn!("Ignoring malformed active-override map: {}", e);
                ActiveMap::default()
            }
        }
    }

    /// Resolve a zone's active flag: backend value first, then the local
    /// override, then the default of `true`.
    pub fn resolve(store: &dyn KvStore, zone_id: u64, backend_value: Option<bool>) -> bool {
        if let Some(v) = backend_value {
            return v;
        }
        Self::read(store).0.get(&zone_id).copied().unwrap_or(true)
    }

    /// Record a local active-flag override for a zone.
    pub fn set(store: &mut dyn KvStore, zone_id: u64, is_active: bool) {
        let mut map = Self::read(store);
        map.0.insert(zone_id, is_active);
        match serde_json::to_string(&map.0) {
            Ok(json) => store.set(ACTIVE_OVERRIDES_KEY, &json),
            Err(e) => log::warn!("Failed to encode active-override map: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("k"), None);

        store.set("k", "v");
        assert_eq!(store.get("k"), Some("v".to_string()));
        assert_eq!(store.len(), 1);

        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_style_override_round_trip() {
        let mut store = MemoryStore::new();
        let style = StyleConfig {
            color: "#2979FF".to_string(),
            weight: 3.5,
            fill_opacity: 0.4,
        };

        assert_eq!(StyleOverrides::load(&store, 11), None);
        StyleOverrides::save(&mut store, 11, &style);
        assert_eq!(StyleOverrides::load(&store, 11), Some(style));

        // Overrides for one zone do not leak to another.
        assert_eq!(StyleOverrides::load(&store, 12), None);

        StyleOverrides::clear(&mut store, 11);
        assert_eq!(StyleOverrides::load(&store, 11), None);
    }

    #[test]
    fn test_style_override_malformed_is_ignored() {
        let mut store = MemoryStore::new();
        store.set("zone_style_3", "{not json");
        assert_eq!(StyleOverrides::load(&store, 3), None);
    }

    #[test]
    fn test_active_overrides_backend_wins() {
        let mut store = MemoryStore::new();
        ActiveOverrides::set(&mut store, 5, false);
        assert!(!ActiveOverrides::resolve(&store, 5, None));
        // Backend-provided value takes precedence over the local map.
        assert!(ActiveOverrides::resolve(&store, 5, Some(true)));
    }

    #[test]
    fn test_active_overrides_default_true() {
        let store = MemoryStore::new();
        assert!(ActiveOverrides::resolve(&store, 99, None));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_json_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("zoneedit-test-{}", std::process::id()));
        let path = dir.join("overrides.json");
        let _ = std::fs::remove_file(&path);

        {
            let mut store = JsonFileStore::open(&path);
            store.set("a", "1");
            store.set("b", "2");
            store.remove("b");
        }

        // A fresh store sees what the first one persisted.
        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("a"), Some("1".to_string()));
        assert_eq!(reopened.get("b"), None);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
