use std::{cmp::Ordering, collections::BinaryHeap, time::Duration};

/// A wake-up scheduled for a sleeping task at a specific simulated time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledWake {
    time: Duration,
    sequence: u64,
    task_id: u64,
}

impl ScheduledWake {
    /// Creates a new scheduled wake-up.
    pub fn new(time: Duration, sequence: u64, task_id: u64) -> Self {
        Self {
            time,
            sequence,
            task_id,
        }
    }

    /// Simulated time at which the task wakes.
    pub fn time(&self) -> Duration {
        self.time
    }

    /// Task woken by this entry.
    pub fn task_id(&self) -> u64 {
        self.task_id
    }
}

impl PartialOrd for ScheduledWake {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledWake {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: reverse both keys so the earliest (time, sequence) pops first.
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Priority queue of pending wake-ups in chronological order.
///
/// Wake-ups scheduled for the same instant pop in the order they were
/// scheduled, which is what makes a tie between two think times resolve the
/// same way on every run.
#[derive(Debug, Default)]
pub struct WakeQueue {
    heap: BinaryHeap<ScheduledWake>,
}

impl WakeQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a wake-up.
    pub fn schedule(&mut self, wake: ScheduledWake) {
        self.heap.push(wake);
    }

    /// Removes and returns the earliest wake-up.
    pub fn pop_earliest(&mut self) -> Option<ScheduledWake> {
        self.heap.pop()
    }

    /// Returns `true` if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of scheduled wake-ups.
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
