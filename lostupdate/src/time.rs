//! Clock abstraction for simulated and real time.
//!
//! Actors and the race orchestrator only ever suspend through a
//! [`TimeProvider`]. Production wiring uses [`TokioTimeProvider`] (real
//! wall-clock delays); tests use [`crate::sim::SimTimeProvider`], which lets a
//! [`crate::sim::SimWorld`] decide exactly when each sleeper wakes.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Clock failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The deadline passed before the guarded future finished.
    #[error("deadline elapsed")]
    Elapsed,

    /// The clock behind the provider is gone.
    #[error("clock shut down")]
    Shutdown,
}

/// The only way actors and the orchestrator observe or spend time.
///
/// Sleeping must be cooperative: a sleeping actor yields to the local
/// executor so sibling actors keep making progress.
#[async_trait(?Send)]
pub trait TimeProvider: Clone {
    /// Suspend the caller for `duration` of this provider's time.
    async fn sleep(&self, duration: Duration) -> Result<(), TimeError>;

    /// Time elapsed since the provider (or the simulated world) was created.
    fn now(&self) -> Duration;

    /// Drive `future` until it finishes or `duration` passes.
    ///
    /// An expired deadline is [`TimeError::Elapsed`]; the future is dropped.
    async fn timeout<F, T>(&self, duration: Duration, future: F) -> Result<T, TimeError>
    where
        F: std::future::Future<Output = T>;
}

/// Wall-clock [`TimeProvider`] on Tokio's timer.
///
/// `now()` is measured from [`TokioTimeProvider::new`], so the race report
/// reads as offsets into the run rather than timestamps.
#[derive(Debug, Clone)]
pub struct TokioTimeProvider {
    origin: tokio::time::Instant,
}

impl TokioTimeProvider {
    /// Provider whose clock reads zero now.
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }

    /// Instant this provider measures from.
    pub fn origin(&self) -> tokio::time::Instant {
        self.origin
    }
}

impl Default for TokioTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl TimeProvider for TokioTimeProvider {
    async fn sleep(&self, duration: Duration) -> Result<(), TimeError> {
        tokio::time::sleep_until(tokio::time::Instant::now() + duration).await;
        Ok(())
    }

    fn now(&self) -> Duration {
        tokio::time::Instant::now().saturating_duration_since(self.origin)
    }

    async fn timeout<F, T>(&self, duration: Duration, future: F) -> Result<T, TimeError>
    where
        F: std::future::Future<Output = T>,
    {
        let deadline = tokio::time::Instant::now() + duration;
        tokio::time::timeout_at(deadline, future)
            .await
            .map_err(|_elapsed| TimeError::Elapsed)
    }
}
