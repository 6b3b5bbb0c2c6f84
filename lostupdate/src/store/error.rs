//! Storage error types.

use thiserror::Error;

/// Errors that can occur during object store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The container was never created.
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    /// No object exists under the key yet.
    #[error("Object not found: {container}/{key}")]
    NotFound {
        /// Container that was searched.
        container: String,
        /// Missing key.
        key: String,
    },

    /// The key cannot address an object in this backend.
    #[error("Invalid object key '{0}'")]
    InvalidKey(String),

    /// The container name cannot address a container in this backend.
    #[error("Invalid container name '{0}'")]
    InvalidContainer(String),

    /// Backend unreachable or refusing requests.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A conditional write found a newer version than the one it was based on.
    #[error("Conflict on '{key}': expected version {expected}, found {actual}")]
    Conflict {
        /// Key that was written.
        key: String,
        /// Version the writer last read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// The backend does not implement the requested operation.
    #[error("Operation not supported by this store: {0}")]
    Unsupported(&'static str),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored object envelope could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Returns `true` for the "nothing stored under this key yet" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}
