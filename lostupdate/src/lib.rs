//! # lostupdate
//!
//! Reproduces the "last writer wins" lost-update anomaly on demand.
//!
//! A chief writes some notes into a shared object. Two reporters then read
//! those notes, think for a while, and each overwrite the object with their
//! own story. Nobody checks whether the object changed in between, so the
//! reporter who finishes last silently erases the other one's work.
//!
//! ## Crate Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  race        RaceOrchestrator: producer → settle →       │
//! │              staggered racers → join → report            │
//! ├──────────────────────────────┬───────────────────────────┤
//! │  actor                       │  config                   │
//! │  read → think → write        │  LOSTUPDATE_STORE_URL     │
//! ├──────────────────────────────┼───────────────────────────┤
//! │  store                       │  time / sim               │
//! │  ObjectStore trait,          │  TimeProvider trait,      │
//! │  in-memory + file backends   │  Tokio clock, SimWorld    │
//! └──────────────────────────────┴───────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use lostupdate::{InMemoryObjectStore, RaceOrchestrator, Scenario, SimWorld, CONTAINER};
//!
//! let sim = SimWorld::new();
//! let time = sim.time_provider();
//! let store = std::rc::Rc::new(InMemoryObjectStore::new(CONTAINER));
//! let report = sim.block_on(async move {
//!     RaceOrchestrator::new(store, time, Scenario::new()).run().await
//! })??;
//! assert_eq!(report.final_value, "[[REPORTER A'S STORY]]");
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod actor;
pub mod config;
pub mod error;
pub mod race;
pub mod sim;
pub mod store;
pub mod time;

pub use actor::{Actor, ActorError, ActorOutcome, Role, WriteMode};
pub use config::{ConfigError, StoreConfig, STORE_URL_ENV};
pub use error::{RaceError, SimulationError, SimulationResult};
pub use race::{Phase, RaceOrchestrator, RaceReport, RacerResult, Scenario, CONTAINER, STORY_KEY};
pub use sim::{SimTimeProvider, SimWorld};
pub use store::{FileObjectStore, InMemoryObjectStore, ObjectStore, StorageError, Versioned};
pub use time::{TimeError, TimeProvider, TokioTimeProvider};
