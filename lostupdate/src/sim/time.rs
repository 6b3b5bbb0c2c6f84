//! [`TimeProvider`] backed by a [`super::SimWorld`].

use async_trait::async_trait;
use std::time::Duration;

use super::world::WeakSimWorld;
use crate::time::{TimeError, TimeProvider};

/// Simulation time provider.
///
/// Holds only a weak handle, so a provider outliving its world reports
/// [`TimeError::Shutdown`] instead of keeping the world alive.
#[derive(Debug, Clone)]
pub struct SimTimeProvider {
    sim: WeakSimWorld,
}

impl SimTimeProvider {
    /// Create a new simulation time provider.
    pub fn new(sim: WeakSimWorld) -> Self {
        Self { sim }
    }
}

#[async_trait(?Send)]
impl TimeProvider for SimTimeProvider {
    async fn sleep(&self, duration: Duration) -> Result<(), TimeError> {
        let sleep_future = self.sim.sleep(duration).map_err(|_| TimeError::Shutdown)?;
        sleep_future.await.map_err(|_| TimeError::Shutdown)
    }

    fn now(&self) -> Duration {
        self.sim.now().unwrap_or(Duration::ZERO)
    }

    async fn timeout<F, T>(&self, duration: Duration, future: F) -> Result<T, TimeError>
    where
        F: std::future::Future<Output = T>,
    {
        let sleep_future = self.sim.sleep(duration).map_err(|_| TimeError::Shutdown)?;

        tokio::select! {
            biased;
            result = future => Ok(result),
            _ = sleep_future => Err(TimeError::Elapsed),
        }
    }
}
