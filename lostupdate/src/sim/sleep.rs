//! Sleeping in simulated time.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use super::world::WeakSimWorld;
use crate::error::SimulationResult;

/// Future that completes once the world has stepped past its wake-up.
///
/// The wake-up is scheduled by [`super::SimWorld::sleep`] when the future is
/// created; polling only checks whether that wake-up has been processed.
#[derive(Debug)]
pub struct SleepFuture {
    sim: WeakSimWorld,
    task_id: u64,
    completed: bool,
}

impl SleepFuture {
    pub(crate) fn new(sim: WeakSimWorld, task_id: u64) -> Self {
        Self {
            sim,
            task_id,
            completed: false,
        }
    }
}

impl Future for SleepFuture {
    type Output = SimulationResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.completed {
            return Poll::Ready(Ok(()));
        }

        let sim = match self.sim.upgrade() {
            Ok(sim) => sim,
            Err(e) => return Poll::Ready(Err(e)),
        };

        if sim.take_awakened(self.task_id) {
            self.completed = true;
            Poll::Ready(Ok(()))
        } else {
            sim.register_waker(self.task_id, cx.waker().clone());
            Poll::Pending
        }
    }
}

impl Drop for SleepFuture {
    fn drop(&mut self) {
        // A sleep abandoned by a timeout or an aborted task must not leave its
        // waker behind.
        if !self.completed {
            if let Ok(sim) = self.sim.upgrade() {
                sim.forget_task(self.task_id);
            }
        }
    }
}
