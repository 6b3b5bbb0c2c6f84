//! The producer-then-racing-actors protocol.
//!
//! ```text
//! Init ──► Producer ──► Settle ──► Race ──► Join ──► Report
//!   │          │                   A ─────────┐
//!   ▼          ▼                   └ stagger ─ B
//! Aborted   Aborted
//! ```
//!
//! Both racers read the producer's notes, think, and overwrite the same key
//! without any version check. Whichever write lands last is the only one left;
//! the other is gone without a trace in the store.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::instrument;

use crate::actor::{Actor, ActorError, ActorOutcome, WriteMode};
use crate::error::RaceError;
use crate::store::ObjectStore;
use crate::time::{TimeError, TimeProvider};

/// Container the demonstration writes into.
pub const CONTAINER: &str = "newsroom";

/// Key of the shared story object.
pub const STORY_KEY: &str = "story.txt";

/// Phases of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Ensuring the container exists.
    Init,
    /// The chief writes the initial notes.
    Producer,
    /// Pacing delay before the race.
    Settle,
    /// Racers launched with a stagger.
    Race,
    /// Waiting for every racer.
    Join,
    /// Reading back the final value.
    Report,
    /// Terminal failure before the race could run.
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Producer => "producer",
            Phase::Settle => "settle",
            Phase::Race => "race",
            Phase::Join => "join",
            Phase::Report => "report",
            Phase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Timing and cast of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Key all actors read and write.
    pub key: String,
    /// Producer run before the race.
    pub chief: Actor,
    /// Delay between producer and race.
    pub settle: Duration,
    /// Racer launched first.
    pub first: Actor,
    /// Racer launched `stagger` after `first`.
    pub second: Actor,
    /// Offset between the two launches. Must be non-zero.
    pub stagger: Duration,
    /// Bound on race + join, if any.
    pub run_timeout: Option<Duration>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            key: STORY_KEY.to_string(),
            chief: Actor::chief("Chief", Duration::from_secs(1)),
            settle: Duration::from_secs(2),
            first: Actor::reporter("Reporter A", Duration::from_secs(12)),
            second: Actor::reporter("Reporter B", Duration::from_secs(4)),
            stagger: Duration::from_secs(4),
            run_timeout: None,
        }
    }
}

impl Scenario {
    /// The canonical demonstration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shared key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Set the producer.
    pub fn chief(mut self, chief: Actor) -> Self {
        self.chief = chief;
        self
    }

    /// Set the settle delay.
    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Set the two racers, in launch order.
    pub fn racers(mut self, first: Actor, second: Actor) -> Self {
        self.first = first;
        self.second = second;
        self
    }

    /// Set the launch offset of the second racer.
    pub fn stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Bound the race and join phases.
    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    /// Apply `mode` to both racers.
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.first = self.first.with_write_mode(mode);
        self.second = self.second.with_write_mode(mode);
        self
    }

    /// Reject scenarios that cannot stagger the racers.
    pub fn validate(&self) -> Result<(), RaceError> {
        if self.stagger.is_zero() {
            return Err(RaceError::InvalidScenario(
                "stagger must be greater than zero".into(),
            ));
        }
        if self.key.is_empty() {
            return Err(RaceError::InvalidScenario("key must not be empty".into()));
        }
        Ok(())
    }
}

/// Outcome of one racer.
#[derive(Debug)]
pub struct RacerResult {
    /// Racer name.
    pub name: String,
    /// What it read and wrote, or why it failed.
    pub outcome: Result<ActorOutcome, ActorError>,
}

/// Everything observed during one run.
#[derive(Debug)]
pub struct RaceReport {
    /// The producer's run.
    pub producer: ActorOutcome,
    /// Racers in launch order.
    pub racers: Vec<RacerResult>,
    /// Value read back after the join.
    pub final_value: String,
    /// Clock reading at the end of the run.
    pub finished_at: Duration,
}

impl RaceReport {
    /// Racer whose story is the final value.
    pub fn winner(&self) -> Option<&str> {
        self.racers
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok())
            .find(|o| o.written == self.final_value)
            .map(|o| o.name.as_str())
    }

    /// Racers that wrote successfully but whose story is no longer stored.
    pub fn overwritten(&self) -> Vec<&str> {
        self.racers
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok())
            .filter(|o| o.written != self.final_value)
            .map(|o| o.name.as_str())
            .collect()
    }

    /// Racers that failed, with their errors.
    pub fn failures(&self) -> Vec<(&str, &ActorError)> {
        self.racers
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (r.name.as_str(), e)))
            .collect()
    }
}

impl fmt::Display for RaceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Race Report ===")?;
        writeln!(
            f,
            "producer  {:<12} wrote {:?} at {:?}",
            self.producer.name, self.producer.written, self.producer.wrote_at
        )?;
        for racer in &self.racers {
            match &racer.outcome {
                Ok(o) => writeln!(
                    f,
                    "racer     {:<12} read {:?} at {:?}, wrote {:?} at {:?}",
                    o.name,
                    o.observed.as_deref().unwrap_or("<nothing>"),
                    o.read_at,
                    o.written,
                    o.wrote_at
                )?,
                Err(e) => writeln!(f, "racer     {:<12} FAILED: {}", racer.name, e)?,
            }
        }
        writeln!(f, "final     {:?} at {:?}", self.final_value, self.finished_at)?;
        let overwritten = self.overwritten();
        if !overwritten.is_empty() {
            writeln!(f, "overwritten without notice: {}", overwritten.join(", "))?;
        }
        Ok(())
    }
}

/// Runs one scenario against a shared store.
///
/// The store handle is shared with every actor task as-is: no lock, no
/// version check, nothing that would serialize the racers.
pub struct RaceOrchestrator<S: ?Sized, T> {
    store: Rc<S>,
    time: T,
    scenario: Scenario,
}

impl<S, T> RaceOrchestrator<S, T>
where
    S: ObjectStore + ?Sized + 'static,
    T: TimeProvider + 'static,
{
    /// Create an orchestrator.
    pub fn new(store: Rc<S>, time: T, scenario: Scenario) -> Self {
        Self {
            store,
            time,
            scenario,
        }
    }

    /// Scenario being run.
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Run every phase and report the final value.
    ///
    /// Must be awaited inside a [`tokio::task::LocalSet`]; racers are local tasks.
    #[instrument(skip(self), fields(container = self.store.container(), key = %self.scenario.key))]
    pub async fn run(&self) -> Result<RaceReport, RaceError> {
        self.scenario.validate()?;
        let key = self.scenario.key.as_str();

        enter(Phase::Init, &self.time);
        if let Err(source) = self.store.ensure_container().await {
            enter(Phase::Aborted, &self.time);
            return Err(RaceError::ContainerUnavailable {
                container: self.store.container().to_string(),
                source,
            });
        }

        enter(Phase::Producer, &self.time);
        let producer = match self.scenario.chief.run(&*self.store, &self.time, key).await {
            Ok(outcome) => outcome,
            Err(source) => {
                enter(Phase::Aborted, &self.time);
                return Err(RaceError::ProducerFailed {
                    actor: self.scenario.chief.name().to_string(),
                    source,
                });
            }
        };

        enter(Phase::Settle, &self.time);
        self.time.sleep(self.scenario.settle).await?;

        let racers = match self.scenario.run_timeout {
            Some(limit) => {
                let mut handles = Vec::new();
                let raced = self
                    .time
                    .timeout(limit, self.race_and_join(&mut handles))
                    .await;
                match raced {
                    Ok(results) => results?,
                    Err(e) => {
                        for handle in &handles {
                            handle.abort();
                        }
                        return Err(match e {
                            TimeError::Elapsed => {
                                tracing::warn!(?limit, "race timed out; remaining racers aborted");
                                RaceError::TimedOut(limit)
                            }
                            other => {
                                tracing::warn!(error = %other, "clock failed during race; racers aborted");
                                RaceError::Time(other)
                            }
                        });
                    }
                }
            }
            None => self.race_and_join(&mut Vec::new()).await?,
        };

        enter(Phase::Report, &self.time);
        let final_value = self
            .store
            .get(key)
            .await
            .map_err(|source| RaceError::ReadBackFailed {
                key: key.to_string(),
                source,
            })?;

        let report = RaceReport {
            producer,
            racers,
            final_value,
            finished_at: self.time.now(),
        };
        tracing::info!(final_value = %report.final_value, winner = ?report.winner(), "race finished");
        Ok(report)
    }

    /// Launch both racers with the stagger, then wait for both.
    ///
    /// Launched handles are pushed into `handles` as soon as they exist so a
    /// timed-out caller can abort them. The join waits for every racer before
    /// reporting a panicked one.
    async fn race_and_join(
        &self,
        handles: &mut Vec<tokio::task::AbortHandle>,
    ) -> Result<Vec<RacerResult>, RaceError> {
        enter(Phase::Race, &self.time);
        let first = self.launch(&self.scenario.first);
        handles.push(first.abort_handle());

        if let Err(e) = self.time.sleep(self.scenario.stagger).await {
            first.abort();
            tracing::warn!(error = %e, "clock failed during stagger; first racer aborted");
            return Err(e.into());
        }
        let second = self.launch(&self.scenario.second);
        handles.push(second.abort_handle());

        enter(Phase::Join, &self.time);
        let joined = [
            (&self.scenario.first, first.await),
            (&self.scenario.second, second.await),
        ];

        let mut results = Vec::with_capacity(joined.len());
        let mut panicked = None;
        for (actor, joined) in joined {
            match joined {
                Ok(outcome) => {
                    if let Err(e) = &outcome {
                        tracing::warn!(actor = actor.name(), error = %e, "racer failed");
                    }
                    results.push(RacerResult {
                        name: actor.name().to_string(),
                        outcome,
                    });
                }
                Err(e) => {
                    tracing::error!(actor = actor.name(), error = %e, "racer task failed");
                    if panicked.is_none() {
                        panicked = Some(RaceError::ActorPanicked {
                            actor: actor.name().to_string(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }
        match panicked {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }

    fn launch(
        &self,
        actor: &Actor,
    ) -> tokio::task::JoinHandle<Result<ActorOutcome, ActorError>> {
        let actor = actor.clone();
        let store = self.store.clone();
        let time = self.time.clone();
        let key = self.scenario.key.clone();
        tracing::debug!(actor = actor.name(), at = ?time.now(), "launching racer");
        tokio::task::spawn_local(async move { actor.run(&*store, &time, &key).await })
    }
}

fn enter<T: TimeProvider>(phase: Phase, time: &T) {
    tracing::info!(%phase, at = ?time.now(), "phase");
}
