//! Application state for the web layer.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api::{HttpStationApi, StationApi};
use crate::favorites::{FavoritesStore, KeyValueStore};
use crate::status_cache::{StatusCache, StatusCacheConfig};

/// Favorites behind a lock, over whichever storage the app was built with.
pub type SharedFavorites = Arc<RwLock<FavoritesStore<Box<dyn KeyValueStore>>>>;

/// Shared application state.
///
/// Contains all the services needed to handle requests. One instance is
/// built at startup and cloned into every handler.
pub struct AppState<A = HttpStationApi> {
    /// Station API client
    pub api: Arc<A>,

    /// Status snapshots, shared by every view
    pub statuses: Arc<StatusCache<A>>,

    /// The user's favorite stations
    pub favorites: SharedFavorites,
}

impl<A: StationApi> AppState<A> {
    /// Create a new app state.
    ///
    /// Favorites are loaded from `storage` immediately.
    pub fn new(api: A, cache_config: &StatusCacheConfig, storage: Box<dyn KeyValueStore>) -> Self {
        let api = Arc::new(api);
        let statuses = Arc::new(StatusCache::new(Arc::clone(&api), cache_config));
        let favorites = Arc::new(RwLock::new(FavoritesStore::load(storage)));

        Self {
            api,
            statuses,
            favorites,
        }
    }
}

impl<A> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            statuses: Arc::clone(&self.statuses),
            favorites: Arc::clone(&self.favorites),
        }
    }
}
