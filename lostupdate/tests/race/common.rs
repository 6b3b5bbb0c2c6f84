//! Shared helpers for race scenarios.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use lostupdate::{
    Actor, InMemoryObjectStore, ObjectStore, RaceError, RaceOrchestrator, RaceReport, Scenario,
    SimWorld, StorageError, Versioned, CONTAINER,
};

/// Which operations a [`FaultyStore`] refuses.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Fail `ensure_container`.
    pub ensure: bool,
    /// Fail `put` of exactly this value.
    pub put_value: Option<String>,
    /// Fail only the n-th `get` (zero-based).
    pub fail_get: Option<usize>,
    /// Panic inside `put` of exactly this value.
    pub panic_on_put: Option<String>,
}

/// Wraps an in-memory store and injects failures.
pub struct FaultyStore {
    inner: InMemoryObjectStore,
    faults: Faults,
    gets: Cell<usize>,
}

impl FaultyStore {
    pub fn new(inner: InMemoryObjectStore, faults: Faults) -> Self {
        Self {
            inner,
            faults,
            gets: Cell::new(0),
        }
    }

    fn injected(op: &str) -> StorageError {
        StorageError::Unavailable(format!("injected {op} failure"))
    }
}

#[async_trait(?Send)]
impl ObjectStore for FaultyStore {
    fn container(&self) -> &str {
        self.inner.container()
    }

    async fn ensure_container(&self) -> Result<(), StorageError> {
        if self.faults.ensure {
            return Err(Self::injected("ensure_container"));
        }
        self.inner.ensure_container().await
    }

    async fn get(&self, key: &str) -> Result<String, StorageError> {
        let seen = self.gets.get();
        self.gets.set(seen + 1);
        if self.faults.fail_get == Some(seen) {
            return Err(Self::injected("get"));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.faults.panic_on_put.as_deref() == Some(value) {
            panic!("injected panic while writing {value}");
        }
        if self.faults.put_value.as_deref() == Some(value) {
            return Err(Self::injected("put"));
        }
        self.inner.put(key, value).await
    }

    async fn get_versioned(&self, key: &str) -> Result<Versioned, StorageError> {
        self.inner.get_versioned(key).await
    }

    async fn put_if_version(
        &self,
        key: &str,
        value: &str,
        expected_version: u64,
    ) -> Result<u64, StorageError> {
        self.inner.put_if_version(key, value, expected_version).await
    }
}

/// Scenario with racer think times and stagger given in seconds.
pub fn scenario(first_secs: u64, second_secs: u64, stagger_secs: u64) -> Scenario {
    Scenario::new()
        .racers(
            Actor::reporter("Reporter A", Duration::from_secs(first_secs)),
            Actor::reporter("Reporter B", Duration::from_secs(second_secs)),
        )
        .stagger(Duration::from_secs(stagger_secs))
}

/// Run `scenario` against `store` in simulated time.
pub fn run_simulated<S>(store: Rc<S>, scenario: Scenario) -> Result<RaceReport, RaceError>
where
    S: ObjectStore + ?Sized + 'static,
{
    let sim = SimWorld::new();
    let time = sim.time_provider();
    sim.block_on(async move { RaceOrchestrator::new(store, time, scenario).run().await })
        .expect("simulation should not deadlock")
}

/// Value currently stored under `key`, read outside any race.
pub fn stored(store: &InMemoryObjectStore, key: &str) -> String {
    let store = store.clone();
    let key = key.to_string();
    SimWorld::new()
        .block_on(async move { store.get(&key).await })
        .expect("read should not deadlock")
        .expect("key should be stored")
}

/// Fresh in-memory store for the demonstration container.
pub fn memory_store() -> InMemoryObjectStore {
    InMemoryObjectStore::new(CONTAINER)
}
