//! In-process object store.

use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::error::StorageError;
use super::traits::{ObjectStore, Versioned};

#[derive(Debug, Default)]
struct Account {
    containers: HashMap<String, HashMap<String, Versioned>>,
    offline: bool,
}

/// Object store held in memory and shared by every clone of the handle.
///
/// State is lost when the last handle is dropped. Each call completes without
/// suspending, so under a single-threaded executor a `put` is never torn.
#[derive(Debug, Clone)]
pub struct InMemoryObjectStore {
    account: Rc<RefCell<Account>>,
    container: String,
}

impl InMemoryObjectStore {
    /// Create a new empty account and a handle to `container` in it.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            account: Rc::new(RefCell::new(Account::default())),
            container: container.into(),
        }
    }

    /// Handle to another container of the same account.
    pub fn with_container(&self, container: impl Into<String>) -> Self {
        Self {
            account: self.account.clone(),
            container: container.into(),
        }
    }

    /// Make every operation on the account fail with `StorageError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.account.borrow_mut().offline = offline;
    }

    /// Whether this handle's container exists.
    pub fn container_exists(&self) -> bool {
        self.account
            .borrow()
            .containers
            .contains_key(&self.container)
    }

    /// Number of objects in this handle's container.
    pub fn len(&self) -> usize {
        self.account
            .borrow()
            .containers
            .get(&self.container)
            .map_or(0, HashMap::len)
    }

    /// Check if this handle's container holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self, account: &Account) -> Result<(), StorageError> {
        if account.offline {
            Err(StorageError::Unavailable(format!(
                "in-memory account offline (container '{}')",
                self.container
            )))
        } else {
            Ok(())
        }
    }

    fn read(&self, key: &str) -> Result<Versioned, StorageError> {
        let account = self.account.borrow();
        self.check_online(&account)?;
        let objects = account
            .containers
            .get(&self.container)
            .ok_or_else(|| StorageError::ContainerNotFound(self.container.clone()))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                container: self.container.clone(),
                key: key.to_string(),
            })
    }

    fn write(
        &self,
        key: &str,
        value: &str,
        expected_version: Option<u64>,
    ) -> Result<u64, StorageError> {
        let mut account = self.account.borrow_mut();
        self.check_online(&account)?;
        let objects = account
            .containers
            .get_mut(&self.container)
            .ok_or_else(|| StorageError::ContainerNotFound(self.container.clone()))?;

        let current = objects.get(key).map_or(0, |o| o.version);
        if let Some(expected) = expected_version {
            if expected != current {
                return Err(StorageError::Conflict {
                    key: key.to_string(),
                    expected,
                    actual: current,
                });
            }
        }

        let version = current + 1;
        objects.insert(
            key.to_string(),
            Versioned {
                value: value.to_string(),
                version,
            },
        );
        Ok(version)
    }
}

#[async_trait(?Send)]
impl ObjectStore for InMemoryObjectStore {
    fn container(&self) -> &str {
        &self.container
    }

    async fn ensure_container(&self) -> Result<(), StorageError> {
        let mut account = self.account.borrow_mut();
        self.check_online(&account)?;
        account
            .containers
            .entry(self.container.clone())
            .or_default();
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String, StorageError> {
        self.read(key).map(|object| object.value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(key, value, None).map(|_| ())
    }

    async fn get_versioned(&self, key: &str) -> Result<Versioned, StorageError> {
        self.read(key)
    }

    async fn put_if_version(
        &self,
        key: &str,
        value: &str,
        expected_version: u64,
    ) -> Result<u64, StorageError> {
        self.write(key, value, Some(expected_version))
    }
}
