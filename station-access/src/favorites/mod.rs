//! Favorite stations and their durable storage.
//!
//! The store is constructed once per application with an injected
//! [`KeyValueStore`], so tests can run against [`MemoryStore`].

mod error;
mod storage;
mod store;

pub use error::StorageError;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{FAVORITES_KEY, FavoritesStore, LEGACY_FAVORITES_KEY};
