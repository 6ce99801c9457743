//! Synchronization primitives built on one weighted, priority-aware engine.
//!
//! # Primitives
//!
//! - [`Semaphore`]: the engine — weighted, priority-ordered admission with
//!   unlock observation
//! - [`Mutex`]: mutual exclusion as the capacity-1, weight-1 view of the
//!   engine
//! - [`WithTimeout`]: deadline decorator over either shape
//!
//! # Release discipline
//!
//! Every grant hands out a [`Releaser`]: a one-shot, idempotent capability
//! closing over the granted weight. Releasers release on drop, so scoped
//! acquisition (`run_exclusive`) and post-timeout cleanup are leak-free by
//! construction.

mod mutex;
mod semaphore;
mod with_timeout;

pub use mutex::{Lock, Mutex};
pub use semaphore::{Acquire, Grant, Releaser, Semaphore, WaitForUnlock};
pub use with_timeout::{with_timeout, with_timeout_on, TimedAcquire, TimedWaitForUnlock, WithTimeout};
