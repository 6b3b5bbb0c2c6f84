//! Directory-backed object store.
//!
//! Layout: `<root>/<container>/<key>.json`, each file holding a
//! [`StoredObject`] envelope. The root plays the role of the storage account
//! and must already exist; containers are created on demand.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::error::StorageError;
use super::traits::{ObjectStore, Versioned};

/// On-disk envelope of one object.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredObject {
    version: u64,
    value: String,
}

/// Object store persisting each object as a JSON file.
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    root: PathBuf,
    container: String,
    /// Held for the duration of one write so its version bump is atomic.
    /// Never held across a caller's read and write.
    write_gate: Rc<tokio::sync::Mutex<()>>,
}

impl FileObjectStore {
    /// Handle to `container` under the account directory `root`.
    pub fn new(root: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            container: container.into(),
            write_gate: Rc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Handle to another container under the same root, sharing the write gate.
    pub fn with_container(&self, container: impl Into<String>) -> Self {
        Self {
            root: self.root.clone(),
            container: container.into(),
            write_gate: self.write_gate.clone(),
        }
    }

    /// Account directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self) -> Result<PathBuf, StorageError> {
        if !is_single_segment(&self.container) {
            return Err(StorageError::InvalidContainer(self.container.clone()));
        }
        Ok(self.root.join(&self.container))
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !is_single_segment(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.container_dir()?.join(format!("{key}.json")))
    }

    async fn require_container(&self) -> Result<(), StorageError> {
        match tokio::fs::metadata(self.container_dir()?).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StorageError::ContainerNotFound(self.container.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::ContainerNotFound(self.container.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let path = self.object_path(key)?;
        self.require_container().await?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_existing(&self, key: &str) -> Result<StoredObject, StorageError> {
        self.read(key).await?.ok_or_else(|| StorageError::NotFound {
            container: self.container.clone(),
            key: key.to_string(),
        })
    }

    async fn write(
        &self,
        key: &str,
        value: &str,
        expected_version: Option<u64>,
    ) -> Result<u64, StorageError> {
        let path = self.object_path(key)?;
        let _gate = self.write_gate.lock().await;

        let current = self.read(key).await?.map_or(0, |o| o.version);
        if let Some(expected) = expected_version {
            if expected != current {
                return Err(StorageError::Conflict {
                    key: key.to_string(),
                    expected,
                    actual: current,
                });
            }
        }

        let object = StoredObject {
            version: current + 1,
            value: value.to_string(),
        };
        let tmp = self.container_dir()?.join(format!(".{key}.tmp"));
        tokio::fs::write(&tmp, serde_json::to_vec(&object)?).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::trace!(path = %path.display(), version = object.version, "object written");
        Ok(object.version)
    }
}

/// A name usable as exactly one path component below its parent.
fn is_single_segment(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\', '\0'])
}

#[async_trait(?Send)]
impl ObjectStore for FileObjectStore {
    fn container(&self) -> &str {
        &self.container
    }

    async fn ensure_container(&self) -> Result<(), StorageError> {
        let dir = self.container_dir()?;
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(StorageError::Unavailable(format!(
                    "{} is not a directory",
                    self.root.display()
                )))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::Unavailable(format!(
                    "{} does not exist",
                    self.root.display()
                )))
            }
            Err(e) => return Err(e.into()),
        }
        tokio::fs::create_dir_all(dir).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String, StorageError> {
        self.read_existing(key).await.map(|o| o.value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(key, value, None).await.map(|_| ())
    }

    async fn get_versioned(&self, key: &str) -> Result<Versioned, StorageError> {
        let object = self.read_existing(key).await?;
        Ok(Versioned {
            value: object.value,
            version: object.version,
        })
    }

    async fn put_if_version(
        &self,
        key: &str,
        value: &str,
        expected_version: u64,
    ) -> Result<u64, StorageError> {
        self.write(key, value, Some(expected_version)).await
    }
}
