//! Favorite stations.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::storage::KeyValueStore;

/// Storage key holding a JSON array of favorite station ids.
pub const FAVORITES_KEY: &str = "mta_favorite_stations";

/// Older storage key holding a JSON object of station id to `true`/`false`.
pub const LEGACY_FAVORITES_KEY: &str = "mta_favorites";

/// The user's favorite stations, persisted through a [`KeyValueStore`].
///
/// The in-memory set is authoritative for the session. Every toggle is
/// written through before returning, but a failed write only logs: the
/// toggle still takes effect in memory.
///
/// Favorites are plain ids and do not track the station list; an id can
/// stay favorited after its station disappears from the API.
pub struct FavoritesStore<S> {
    storage: S,
    ids: Vec<String>,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Load favorites from storage.
    ///
    /// Reads the current array key and merges in the legacy map key.
    /// Missing or malformed values count as empty.
    pub fn load(storage: S) -> Self {
        let mut ids = storage
            .get(FAVORITES_KEY)
            .map(|raw| parse_id_array(&raw))
            .unwrap_or_default();

        if let Some(raw) = storage.get(LEGACY_FAVORITES_KEY) {
            for id in parse_legacy_map(&raw) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        debug!(count = ids.len(), "loaded favorites");
        Self { storage, ids }
    }

    /// Flip membership of `station_id` and persist. Returns the new membership.
    ///
    /// Empty ids are ignored.
    pub fn toggle(&mut self, station_id: &str) -> bool {
        if station_id.is_empty() {
            return false;
        }

        let now_favorite = match self.ids.iter().position(|id| id == station_id) {
            Some(idx) => {
                self.ids.remove(idx);
                false
            }
            None => {
                self.ids.push(station_id.to_string());
                true
            }
        };

        self.persist();
        now_favorite
    }

    /// Whether `station_id` is a favorite.
    pub fn is_favorite(&self, station_id: &str) -> bool {
        self.ids.iter().any(|id| id == station_id)
    }

    /// All favorite ids, oldest first.
    pub fn list(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Write both keys together. Failures are logged and dropped.
    ///
    /// The legacy map goes first: with a store that writes key by key, a
    /// failure then leaves the array key holding the last state that was
    /// fully written, never one the legacy map contradicts.
    fn persist(&self) {
        let array = Value::Array(self.ids.iter().cloned().map(Value::String).collect());
        let legacy: Map<String, Value> = self
            .ids
            .iter()
            .map(|id| (id.clone(), Value::Bool(true)))
            .collect();

        let array = array.to_string();
        let legacy = Value::Object(legacy).to_string();
        let entries = [
            (LEGACY_FAVORITES_KEY, legacy.as_str()),
            (FAVORITES_KEY, array.as_str()),
        ];
        if let Err(e) = self.storage.set_many(&entries) {
            warn!(count = self.ids.len(), error = %e, "failed to persist favorites");
        }
    }
}

/// Ids from a JSON array. Non-string entries are skipped.
fn parse_id_array(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(items) => {
            let mut ids: Vec<String> = Vec::with_capacity(items.len());
            for id in items.iter().filter_map(Value::as_str) {
                if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
                    ids.push(id.to_string());
                }
            }
            ids
        }
        Err(e) => {
            warn!(key = FAVORITES_KEY, error = %e, "stored favorites are malformed, ignoring");
            Vec::new()
        }
    }
}

/// Ids mapped to `true` in a legacy JSON object.
fn parse_legacy_map(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Map<String, Value>>(raw) {
        Ok(map) => map
            .into_iter()
            .filter(|(id, flag)| !id.is_empty() && flag.as_bool() == Some(true))
            .map(|(id, _)| id)
            .collect(),
        Err(e) => {
            warn!(key = LEGACY_FAVORITES_KEY, error = %e, "stored favorites are malformed, ignoring");
            Vec::new()
        }
    }
}
