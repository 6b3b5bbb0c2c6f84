//! Object store trait abstraction.

use async_trait::async_trait;

use super::error::StorageError;

/// A value together with the version it was stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    /// Stored value.
    pub value: String,
    /// Version of the object; bumped by every successful write.
    pub version: u64,
}

/// Handle to one container of a shared key-value object store.
///
/// `get` and `put` are independent and unsynchronized: nothing ties a `put`
/// to the value its caller last read, so concurrent read-modify-write cycles
/// silently overwrite each other.
///
/// Single-core design, no Send bounds needed.
#[async_trait(?Send)]
pub trait ObjectStore {
    /// Name of the container this handle addresses.
    fn container(&self) -> &str;

    /// Create the container if it does not exist yet.
    ///
    /// Idempotent: calling it again changes nothing.
    async fn ensure_container(&self) -> Result<(), StorageError>;

    /// Current value of `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(value)`: the latest value written
    /// - `Err(StorageError::NotFound)`: nothing was ever written under `key`
    /// - `Err(StorageError::ContainerNotFound)`: the container does not exist
    async fn get(&self, key: &str) -> Result<String, StorageError>;

    /// Unconditionally replace the value of `key`.
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Current value of `key` together with its version.
    ///
    /// Opt-in half of the conditional write path.
    async fn get_versioned(&self, _key: &str) -> Result<Versioned, StorageError> {
        Err(StorageError::Unsupported("get_versioned"))
    }

    /// Write `value` only if `key` is still at `expected_version`.
    ///
    /// Returns the new version, or `StorageError::Conflict` when another
    /// writer got there first. `put` is unaffected by this method.
    async fn put_if_version(
        &self,
        _key: &str,
        _value: &str,
        _expected_version: u64,
    ) -> Result<u64, StorageError> {
        Err(StorageError::Unsupported("put_if_version"))
    }
}
