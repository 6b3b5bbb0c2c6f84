//! The last writer wins, and which writer is last depends only on timing.

use std::rc::Rc;
use std::time::Duration;

use lostupdate::{ObjectStore, SimWorld, CONTAINER, STORY_KEY};

use super::common::{memory_store, run_simulated, scenario};

const STORY_A: &str = "[[REPORTER A'S STORY]]";
const STORY_B: &str = "[[REPORTER B'S STORY]]";
const NOTES: &str = "[[CHIEF'S STORY NOTES]]";

#[test]
fn test_canonical_scenario_timeline() {
    let store = Rc::new(memory_store());
    let report = run_simulated(store.clone(), scenario(12, 4, 4)).unwrap();

    assert_eq!(report.producer.written, NOTES);

    let a = report.racers[0].outcome.as_ref().unwrap();
    let b = report.racers[1].outcome.as_ref().unwrap();

    // Both racers start from the chief's notes.
    assert_eq!(a.observed.as_deref(), Some(NOTES));
    assert_eq!(b.observed.as_deref(), Some(NOTES));

    // Relative to the race start, B writes at 8s and A at 12s.
    let race_start = a.read_at;
    assert_eq!(b.read_at - race_start, Duration::from_secs(4));
    assert_eq!(b.wrote_at - race_start, Duration::from_secs(8));
    assert_eq!(a.wrote_at - race_start, Duration::from_secs(12));

    assert_eq!(report.final_value, STORY_A);
    assert_eq!(report.overwritten(), vec!["Reporter B"]);

    // Nothing in the store remembers B's story.
    let remaining = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(store.get(STORY_KEY))
        .unwrap();
    assert_eq!(remaining, STORY_A);
}

#[test]
fn test_ordering_law() {
    // (tA, tB, s): A finishes at tA, B at s + tB.
    let cases = [
        (12, 4, 4),
        (10, 1, 1),
        (10, 8, 1),
        (10, 2, 9),
        (3, 5, 1),
        (30, 29, 2),
        (7, 1, 5),
        (7, 3, 5),
    ];

    for (t_a, t_b, s) in cases {
        let report = run_simulated(Rc::new(memory_store()), scenario(t_a, t_b, s)).unwrap();
        let expected = if s + t_b < t_a { STORY_A } else { STORY_B };
        assert_eq!(
            report.final_value, expected,
            "tA={t_a} tB={t_b} s={s}: expected {expected}"
        );
        assert_eq!(report.overwritten().len(), 1);
        assert!(report.failures().is_empty());
    }
}

#[test]
fn test_racers_overlap_instead_of_serializing() {
    let report = run_simulated(Rc::new(memory_store()), scenario(12, 4, 4)).unwrap();
    let a = report.racers[0].outcome.as_ref().unwrap();
    let b = report.racers[1].outcome.as_ref().unwrap();

    // B read while A was still thinking, so neither saw the other's story.
    assert!(b.read_at < a.wrote_at);
    assert!(!a.observed.as_deref().unwrap_or_default().contains("REPORTER"));
    assert!(!b.observed.as_deref().unwrap_or_default().contains("REPORTER"));
}

#[test]
fn test_sequential_puts_keep_only_the_last() {
    let sim = SimWorld::new();
    let store = memory_store();

    let last = sim
        .block_on(async move {
            store.ensure_container().await.unwrap();
            let writes = ["one", "two", "three", "two", "final"];
            for value in writes {
                store.put(STORY_KEY, value).await.unwrap();
            }
            store.get(STORY_KEY).await.unwrap()
        })
        .unwrap();

    assert_eq!(last, "final");
}

#[test]
fn test_ensure_container_twice_is_harmless() {
    let store = memory_store();
    let sim = SimWorld::new();

    let (value, exists) = sim
        .block_on(async move {
            store.ensure_container().await.unwrap();
            store.put(STORY_KEY, "kept").await.unwrap();
            store.ensure_container().await.unwrap();
            (store.get(STORY_KEY).await.unwrap(), store.container_exists())
        })
        .unwrap();

    assert_eq!(value, "kept");
    assert!(exists);
    assert_eq!(CONTAINER, "newsroom");
}
