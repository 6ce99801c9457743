//! Weighted, priority-aware async synchronization.
//!
//! The core of this crate is one scheduling engine: [`Semaphore`], a
//! counting semaphore whose acquisitions carry a *weight* (how much of the
//! pool they consume) and a *priority* (higher is served first; equal
//! priorities are FIFO). Around it sit three thin surfaces:
//!
//! - [`Mutex`]: mutual exclusion as the capacity-1, weight-1 view of the
//!   engine
//! - [`WithTimeout`]: a deadline decorator that races any acquisition
//!   against a [`Timer`](time::Timer) and guarantees a lost race never
//!   leaks capacity
//! - fail-fast acquisition (`try_acquire`) that never queues
//!
//! The engine is cooperative: all scheduling decisions run to completion
//! inside one internal lock, futures suspend only at their poll boundary,
//! and [`Releaser`]s return capacity on drop, so scoped use is leak-free by
//! construction.
//!
//! # Example
//!
//! ```ignore
//! use fairsem::Semaphore;
//!
//! let pool = Semaphore::new(8);
//!
//! // Take 3 connections; urgent maintenance outranks the default priority.
//! let (_, worker) = pool.acquire_weighted(3).await?;
//! let (_, maintenance) = pool.acquire_with_priority(1, 10).await?;
//!
//! drop(worker);       // capacity returns on drop
//! drop(maintenance);
//! ```
//!
//! Observing without acquiring:
//!
//! ```ignore
//! // Resolves once 2 units could be locked, consuming nothing.
//! pool.wait_for_unlock_weighted(2).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod sync;
pub mod test_logging;
pub mod time;

#[cfg(test)]
pub(crate) mod test_utils;

#[doc(hidden)]
pub use tracing;

pub use error::{AcquireError, CancelReason, InvalidWeight, TryAcquireError, UnlockWaitError};
pub use sync::{
    with_timeout, with_timeout_on, Acquire, Grant, Lock, Mutex, Releaser, Semaphore, TimedAcquire,
    TimedWaitForUnlock, WaitForUnlock, WithTimeout,
};
