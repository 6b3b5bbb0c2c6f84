//! The opt-in conditional write turns the silent loss into a visible conflict.

use std::rc::Rc;

use lostupdate::{ActorError, ObjectStore, StorageError, WriteMode, STORY_KEY};

use super::common::{memory_store, run_simulated, scenario};

#[test]
fn test_stale_writer_is_rejected() {
    let store = Rc::new(memory_store());
    let report = run_simulated(
        store.clone(),
        scenario(12, 4, 4).write_mode(WriteMode::IfUnchanged),
    )
    .unwrap();

    assert_eq!(report.final_value, "[[REPORTER B'S STORY]]");
    assert!(report.overwritten().is_empty());

    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "Reporter A");
    assert!(matches!(
        failures[0].1,
        ActorError::Storage(StorageError::Conflict {
            expected: 1,
            actual: 2,
            ..
        })
    ));

    let stored = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(store.get_versioned(STORY_KEY))
        .unwrap();
    assert_eq!(stored.version, 2);
}

#[test]
fn test_base_put_contract_unchanged() {
    // Same timing without the opt-in: A silently overwrites B.
    let report = run_simulated(Rc::new(memory_store()), scenario(12, 4, 4)).unwrap();
    assert_eq!(report.final_value, "[[REPORTER A'S STORY]]");
    assert!(report.failures().is_empty());
}
