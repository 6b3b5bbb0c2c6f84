//! Deterministic simulated time.
//!
//! [`SimWorld`] keeps a queue of pending wake-ups ordered by
//! `(deadline, scheduling order)` and only advances time when the executor
//! has gone quiet. Two actors that sleep `4s` and `12s` therefore always wake
//! in that order, independent of wall-clock jitter, which is what lets tests
//! pin down which of two racing writes lands last.
//!
//! ```ignore
//! let sim = SimWorld::new();
//! let time = sim.time_provider();
//! let now = sim.block_on(async move {
//!     time.sleep(Duration::from_secs(12)).await?;
//!     Ok::<_, TimeError>(time.now())
//! })?;
//! ```
//!
//! Simulated runs should stick to in-process stores: I/O completing on
//! another thread is invisible to the quiescence check.

mod events;
mod sleep;
mod time;
mod world;

pub use events::{ScheduledWake, WakeQueue};
pub use sleep::SleepFuture;
pub use time::SimTimeProvider;
pub use world::{SimWorld, WeakSimWorld};
