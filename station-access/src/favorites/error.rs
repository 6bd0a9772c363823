//! Favorites persistence error types.

use std::path::PathBuf;

/// Errors from the durable key/value store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("storage I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to encode the stored data
    #[error("failed to serialize storage: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store refused the write (e.g. out of space)
    #[error("storage write rejected: {0}")]
    Rejected(String),
}
