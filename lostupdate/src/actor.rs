//! Actors performing one uncoordinated read → think → write cycle.

use std::time::Duration;

use thiserror::Error;
use tracing::instrument;

use crate::store::{ObjectStore, StorageError};
use crate::time::{TimeError, TimeProvider};

/// Why an actor stopped before its write went out.
#[derive(Debug, Error)]
pub enum ActorError {
    /// A read or write was refused by the store.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The clock failed during think time; nothing was written.
    #[error("think time interrupted: {0}")]
    Clock(#[from] TimeError),
}

/// What an actor writes and how it introduces itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Produces the initial notes everyone else starts from.
    Chief,
    /// Rewrites the story from the notes.
    Reporter,
}

/// How an actor's write relates to what it read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Unconditional overwrite; the last writer wins.
    #[default]
    LastWriterWins,
    /// Write only if the object is still at the version that was read.
    IfUnchanged,
}

/// One simulated participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    name: String,
    think_time: Duration,
    role: Role,
    write_mode: WriteMode,
}

/// What a completed run observed and wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorOutcome {
    /// Actor name.
    pub name: String,
    /// Value read before thinking; `None` if nothing was stored yet.
    pub observed: Option<String>,
    /// Value written after thinking.
    pub written: String,
    /// Clock reading when the read completed.
    pub read_at: Duration,
    /// Clock reading when the write completed.
    pub wrote_at: Duration,
}

impl Actor {
    /// Create an actor writing unconditionally.
    pub fn new(name: impl Into<String>, think_time: Duration, role: Role) -> Self {
        Self {
            name: name.into(),
            think_time,
            role,
            write_mode: WriteMode::LastWriterWins,
        }
    }

    /// A chief producing the initial notes.
    pub fn chief(name: impl Into<String>, think_time: Duration) -> Self {
        Self::new(name, think_time, Role::Chief)
    }

    /// A reporter rewriting the story.
    pub fn reporter(name: impl Into<String>, think_time: Duration) -> Self {
        Self::new(name, think_time, Role::Reporter)
    }

    /// Use `mode` for this actor's write.
    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Actor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time spent between reading and writing.
    pub fn think_time(&self) -> Duration {
        self.think_time
    }

    /// Actor role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Write mode.
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    /// The text this actor writes. Depends only on name and role, never on
    /// what was read.
    pub fn story(&self) -> String {
        let author = self.name.to_uppercase();
        match self.role {
            Role::Chief => format!("[[{author}'S STORY NOTES]]"),
            Role::Reporter => format!("[[{author}'S STORY]]"),
        }
    }

    /// Read `key`, think, then write this actor's story to `key`.
    ///
    /// A missing object is read as `None`. Any other storage error aborts the
    /// run; nothing is retried. A clock failure during think time also aborts
    /// it, so a write never goes out earlier than the configured think time.
    #[instrument(skip(self, store, time), fields(actor = %self.name, think = ?self.think_time))]
    pub async fn run<S, T>(
        &self,
        store: &S,
        time: &T,
        key: &str,
    ) -> Result<ActorOutcome, ActorError>
    where
        S: ObjectStore + ?Sized,
        T: TimeProvider,
    {
        let (observed, version) = match self.write_mode {
            WriteMode::LastWriterWins => match store.get(key).await {
                Ok(value) => (Some(value), 0),
                Err(e) if e.is_not_found() => (None, 0),
                Err(e) => return Err(e.into()),
            },
            WriteMode::IfUnchanged => match store.get_versioned(key).await {
                Ok(read) => (Some(read.value), read.version),
                Err(e) if e.is_not_found() => (None, 0),
                Err(e) => return Err(e.into()),
            },
        };
        let read_at = time.now();
        tracing::info!(?observed, at = ?read_at, "read");

        if let Err(e) = time.sleep(self.think_time).await {
            tracing::warn!(error = %e, "think time interrupted; write skipped");
            return Err(e.into());
        }

        let written = self.story();
        match self.write_mode {
            WriteMode::LastWriterWins => store.put(key, &written).await?,
            WriteMode::IfUnchanged => {
                store.put_if_version(key, &written, version).await?;
            }
        }
        let wrote_at = time.now();
        tracing::info!(%written, at = ?wrote_at, "wrote");

        Ok(ActorOutcome {
            name: self.name.clone(),
            observed,
            written,
            read_at,
            wrote_at,
        })
    }
}
