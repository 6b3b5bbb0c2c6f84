//! Failures in each phase and how far they reach.

use std::rc::Rc;

use lostupdate::{ActorError, ConfigError, RaceError, StorageError, StoreConfig, STORY_KEY};

use super::common::{memory_store, run_simulated, scenario, stored, Faults, FaultyStore};

#[test]
fn test_invalid_config_never_reaches_store() {
    let err = StoreConfig::parse(Some("AccountName=newsroom;AccountKey=secret".into())).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));

    let err = StoreConfig::parse(None).unwrap_err();
    assert!(matches!(err, ConfigError::Missing { .. }));
}

#[test]
fn test_unreachable_store_aborts_before_producer() {
    let inner = memory_store();
    inner.set_offline(true);
    let store = Rc::new(inner.clone());

    let err = run_simulated(store, scenario(12, 4, 4)).unwrap_err();
    assert!(matches!(
        err,
        RaceError::ContainerUnavailable {
            source: StorageError::Unavailable(_),
            ..
        }
    ));

    inner.set_offline(false);
    assert!(!inner.container_exists());
    assert!(inner.is_empty());
}

#[test]
fn test_ensure_failure_aborts() {
    let inner = memory_store();
    let store = Rc::new(FaultyStore::new(
        inner.clone(),
        Faults {
            ensure: true,
            ..Faults::default()
        },
    ));

    let err = run_simulated(store, scenario(12, 4, 4)).unwrap_err();
    assert!(matches!(err, RaceError::ContainerUnavailable { .. }));
    assert!(inner.is_empty());
}

#[test]
fn test_producer_failure_skips_race() {
    let inner = memory_store();
    let store = Rc::new(FaultyStore::new(
        inner.clone(),
        Faults {
            put_value: Some("[[CHIEF'S STORY NOTES]]".into()),
            ..Faults::default()
        },
    ));

    let err = run_simulated(store, scenario(12, 4, 4)).unwrap_err();
    match err {
        RaceError::ProducerFailed { actor, .. } => assert_eq!(actor, "Chief"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(inner.container_exists());
    assert!(inner.is_empty());
}

#[test]
fn test_failing_racer_does_not_cancel_the_other() {
    // A would win, but its write fails; B's earlier write survives.
    let store = Rc::new(FaultyStore::new(
        memory_store(),
        Faults {
            put_value: Some("[[REPORTER A'S STORY]]".into()),
            ..Faults::default()
        },
    ));

    let report = run_simulated(store, scenario(12, 4, 4)).unwrap();

    assert_eq!(report.final_value, "[[REPORTER B'S STORY]]");
    assert_eq!(report.winner(), Some("Reporter B"));
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "Reporter A");
    assert!(matches!(
        failures[0].1,
        ActorError::Storage(StorageError::Unavailable(_))
    ));
    assert!(report.to_string().contains("Reporter A   FAILED"));
}

#[test]
fn test_racer_read_failure_is_local() {
    // Gets in order: chief, A, B, read-back. Only B's read fails.
    let store = Rc::new(FaultyStore::new(
        memory_store(),
        Faults {
            fail_get: Some(2),
            ..Faults::default()
        },
    ));

    let report = run_simulated(store, scenario(12, 4, 4)).unwrap();

    assert_eq!(report.final_value, "[[REPORTER A'S STORY]]");
    assert!(report.overwritten().is_empty());
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "Reporter B");
}

#[test]
fn test_read_back_failure() {
    let store = Rc::new(FaultyStore::new(
        memory_store(),
        Faults {
            fail_get: Some(3),
            ..Faults::default()
        },
    ));

    let err = run_simulated(store, scenario(12, 4, 4)).unwrap_err();
    assert!(matches!(err, RaceError::ReadBackFailed { ref key, .. } if key == "story.txt"));
}

#[test]
fn test_panicking_racer_still_waits_for_the_other() {
    // A's put panics at t=4; B reads at t=4 and writes at t=14.
    let inner = memory_store();
    let store = Rc::new(FaultyStore::new(
        inner.clone(),
        Faults {
            panic_on_put: Some("[[REPORTER A'S STORY]]".into()),
            ..Faults::default()
        },
    ));

    let err = run_simulated(store, scenario(1, 10, 1)).unwrap_err();

    match err {
        RaceError::ActorPanicked { actor, .. } => assert_eq!(actor, "Reporter A"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(stored(&inner, STORY_KEY), "[[REPORTER B'S STORY]]");
}
