//! Error types for the simulated world and the race orchestrator.
//!
//! Storage, configuration and clock errors live next to the code that raises
//! them ([`crate::store::StorageError`], [`crate::config::ConfigError`],
//! [`crate::time::TimeError`]).

use std::time::Duration;

use thiserror::Error;

use crate::actor::ActorError;
use crate::store::StorageError;
use crate::time::TimeError;

/// Errors that can occur while driving a [`crate::sim::SimWorld`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// The simulation has been dropped and is no longer accessible.
    #[error("Simulation has been shut down")]
    Shutdown,

    /// Nothing is runnable and no timer is pending, yet the driven task is unfinished.
    #[error("Simulation deadlocked at {at:?}: no pending events and no runnable task")]
    Deadlock {
        /// Simulated time at which progress stopped.
        at: Duration,
    },

    /// The driven task panicked or was cancelled.
    #[error("Simulated task failed: {0}")]
    TaskPanicked(String),

    /// The local runtime could not be built.
    #[error("Failed to build simulation runtime: {0}")]
    Runtime(String),
}

/// A type alias for `Result<T, SimulationError>`.
pub type SimulationResult<T> = Result<T, SimulationError>;

/// Errors that end a race run as a whole.
///
/// A single racer's failure is *not* a `RaceError`: it is recorded in the
/// [`crate::race::RaceReport`] next to the other racer's outcome.
#[derive(Debug, Error)]
pub enum RaceError {
    /// The scenario cannot produce an overlapping race.
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    /// The container could not be created; no actor ran.
    #[error("Container '{container}' unavailable: {source}")]
    ContainerUnavailable {
        /// Container that could not be ensured.
        container: String,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// The producer could not write the initial value; the race never started.
    #[error("Producer '{actor}' failed: {source}")]
    ProducerFailed {
        /// Name of the producing actor.
        actor: String,
        /// Why the producer stopped.
        #[source]
        source: ActorError,
    },

    /// The final value could not be read back after the race.
    #[error("Failed to read back '{key}': {source}")]
    ReadBackFailed {
        /// Key that was read.
        key: String,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// The race did not finish within the configured run timeout.
    #[error("Race timed out after {0:?}")]
    TimedOut(Duration),

    /// A racer task panicked or was cancelled. Reported only once every
    /// racer has been joined.
    #[error("Actor '{actor}' task failed: {reason}")]
    ActorPanicked {
        /// Name of the actor.
        actor: String,
        /// Join error description.
        reason: String,
    },

    /// The clock failed during a pacing delay or the run timeout.
    #[error("Clock failure: {0}")]
    Time(#[from] TimeError),
}
