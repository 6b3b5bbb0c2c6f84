//! The simulated world: simulated time, pending wake-ups and the driver loop.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    future::Future,
    rc::{Rc, Weak},
    task::Waker,
    time::Duration,
};

use super::events::{ScheduledWake, WakeQueue};
use super::sleep::SleepFuture;
use super::time::SimTimeProvider;
use crate::error::{SimulationError, SimulationResult};

/// Consecutive yields without simulated activity before the driver treats the
/// executor as idle and advances time.
const QUIESCENCE_YIELDS: usize = 8;

#[derive(Debug, Default)]
struct WorldState {
    current_time: Duration,
    queue: WakeQueue,
    next_sequence: u64,
    next_task_id: u64,
    awakened_tasks: HashSet<u64>,
    task_wakers: HashMap<u64, Waker>,
    /// Sleepers dropped before their wake-up was processed.
    cancelled_tasks: HashSet<u64>,
    events_processed: u64,
    /// Bumped on every schedule, step and completed sleep.
    activity: u64,
}

/// Deterministic simulated world.
///
/// Time only moves when [`SimWorld::step`] processes the earliest pending
/// wake-up. Cloning yields another handle to the same world.
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    inner: Rc<RefCell<WorldState>>,
}

/// Non-owning handle to a [`SimWorld`], held by sleepers and time providers.
#[derive(Debug, Clone)]
pub struct WeakSimWorld {
    inner: Weak<RefCell<WorldState>>,
}

impl SimWorld {
    /// Creates a world at simulated time zero with nothing scheduled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time.
    pub fn now(&self) -> Duration {
        self.inner.borrow().current_time
    }

    /// Returns a weak handle to this world.
    pub fn downgrade(&self) -> WeakSimWorld {
        WeakSimWorld {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Time provider backed by this world.
    pub fn time_provider(&self) -> SimTimeProvider {
        SimTimeProvider::new(self.downgrade())
    }

    /// Schedules a wake-up `duration` from now and returns the future waiting on it.
    pub fn sleep(&self, duration: Duration) -> SleepFuture {
        let task_id = {
            let mut state = self.inner.borrow_mut();
            let task_id = state.next_task_id;
            state.next_task_id += 1;
            let sequence = state.next_sequence;
            state.next_sequence += 1;
            let wake_at = state.current_time + duration;
            state
                .queue
                .schedule(ScheduledWake::new(wake_at, sequence, task_id));
            state.activity += 1;
            task_id
        };
        SleepFuture::new(self.downgrade(), task_id)
    }

    /// Processes the earliest pending wake-up, advancing time to it.
    ///
    /// Returns `true` if more wake-ups remain.
    pub fn step(&self) -> bool {
        let (waker, more) = {
            let mut state = self.inner.borrow_mut();
            let Some(wake) = state.queue.pop_earliest() else {
                return false;
            };
            state.current_time = wake.time();
            state.events_processed += 1;
            state.activity += 1;
            let waker = state.task_wakers.remove(&wake.task_id());
            if !state.cancelled_tasks.remove(&wake.task_id()) {
                state.awakened_tasks.insert(wake.task_id());
            }
            (waker, !state.queue.is_empty())
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        more
    }

    /// Processes wake-ups until none remain.
    pub fn run_until_empty(&self) {
        while self.step() {}
    }

    /// Returns `true` if wake-ups are waiting to be processed.
    pub fn has_pending_events(&self) -> bool {
        !self.inner.borrow().queue.is_empty()
    }

    /// Number of wake-ups waiting to be processed.
    pub fn pending_event_count(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Number of wake-ups processed so far.
    pub fn events_processed(&self) -> u64 {
        self.inner.borrow().events_processed
    }

    fn activity(&self) -> u64 {
        self.inner.borrow().activity
    }

    pub(crate) fn take_awakened(&self, task_id: u64) -> bool {
        let mut state = self.inner.borrow_mut();
        let awake = state.awakened_tasks.remove(&task_id);
        if awake {
            state.activity += 1;
        }
        awake
    }

    pub(crate) fn register_waker(&self, task_id: u64, waker: Waker) {
        self.inner.borrow_mut().task_wakers.insert(task_id, waker);
    }

    pub(crate) fn forget_task(&self, task_id: u64) {
        let mut state = self.inner.borrow_mut();
        state.task_wakers.remove(&task_id);
        if !state.awakened_tasks.remove(&task_id) {
            state.cancelled_tasks.insert(task_id);
        }
    }

    /// Drives `future` to completion in simulated time.
    ///
    /// The future runs as a local task; the driver yields to the executor
    /// until no simulated activity has happened for a few consecutive yields,
    /// then steps the earliest wake-up. Must be awaited inside a
    /// [`tokio::task::LocalSet`].
    pub async fn run_until<F>(&self, future: F) -> SimulationResult<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let handle = tokio::task::spawn_local(future);
        let mut quiet_yields = 0;

        while !handle.is_finished() {
            let before = self.activity();
            tokio::task::yield_now().await;
            if self.activity() != before {
                quiet_yields = 0;
                continue;
            }

            quiet_yields += 1;
            if quiet_yields < QUIESCENCE_YIELDS {
                continue;
            }
            quiet_yields = 0;

            if handle.is_finished() {
                break;
            }
            if !self.has_pending_events() {
                tracing::error!(at = ?self.now(), "simulation deadlocked");
                handle.abort();
                return Err(SimulationError::Deadlock { at: self.now() });
            }
            self.step();
            tracing::trace!(now = ?self.now(), "simulation stepped");
        }

        handle
            .await
            .map_err(|e| SimulationError::TaskPanicked(e.to_string()))
    }

    /// Builds a current-thread runtime and [`tokio::task::LocalSet`], then
    /// drives `future` with [`SimWorld::run_until`].
    ///
    /// Must not be called from inside another Tokio runtime.
    pub fn block_on<F>(&self, future: F) -> SimulationResult<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SimulationError::Runtime(e.to_string()))?;
        let local = tokio::task::LocalSet::new();
        local.block_on(&runtime, self.run_until(future))
    }
}

impl WeakSimWorld {
    /// Upgrades to a strong handle, failing once the world is gone.
    pub fn upgrade(&self) -> SimulationResult<SimWorld> {
        self.inner
            .upgrade()
            .map(|inner| SimWorld { inner })
            .ok_or(SimulationError::Shutdown)
    }

    /// See [`SimWorld::sleep`].
    pub fn sleep(&self, duration: Duration) -> SimulationResult<SleepFuture> {
        Ok(self.upgrade()?.sleep(duration))
    }

    /// See [`SimWorld::now`].
    pub fn now(&self) -> SimulationResult<Duration> {
        Ok(self.upgrade()?.now())
    }
}
