//! Mutual-exclusion façade over the weighted engine.
//!
//! A mutex is the capacity-1, weight-1 special case of [`Semaphore`]; this
//! type adds no scheduling of its own and forwards every call. Priorities
//! still apply: a strictly higher-priority lock request is served before
//! queued lower-priority ones.
//!
//! # Example
//!
//! ```ignore
//! use fairsem::Mutex;
//!
//! let mutex = Mutex::new();
//! let releaser = mutex.acquire().await?;
//! // ... critical section ...
//! drop(releaser);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use crate::error::{AcquireError, CancelReason, TryAcquireError};
use crate::sync::semaphore::{internal, Acquire, Releaser, Semaphore, WaitForUnlock};
use crate::sync::with_timeout::{with_timeout, with_timeout_on, WithTimeout};
use crate::time::Timer;
use std::sync::Arc;

/// An async mutex: a binary, weight-1 view of the semaphore engine.
///
/// Cloning returns another handle to the same mutex.
#[derive(Debug, Clone)]
pub struct Mutex {
    semaphore: Semaphore,
}

impl Mutex {
    /// Creates an unlocked mutex.
    #[must_use]
    pub fn new() -> Self {
        Self {
            semaphore: Semaphore::new(1),
        }
    }

    /// Creates an unlocked mutex with a custom cancellation reason.
    #[must_use]
    pub fn with_cancel_reason(cancel_reason: CancelReason) -> Self {
        Self {
            semaphore: Semaphore::with_cancel_reasons(
                1,
                cancel_reason,
                CancelReason::unlock_default(),
            ),
        }
    }

    /// Locks the mutex at priority 0.
    pub fn acquire(&self) -> Lock {
        self.acquire_with_priority(0)
    }

    /// Locks the mutex at the given priority.
    pub fn acquire_with_priority(&self, priority: i64) -> Lock {
        Lock {
            inner: self.semaphore.acquire_with_priority(1, priority),
        }
    }

    /// Fail-fast lock attempt.
    ///
    /// # Errors
    ///
    /// [`TryAcquireError::AlreadyLocked`] if the mutex is held or contended.
    pub fn try_acquire(&self) -> Result<Releaser, TryAcquireError> {
        self.semaphore.try_acquire().map(|(_, releaser)| releaser)
    }

    /// Runs `callback` while holding the lock, releasing on every exit path.
    ///
    /// # Errors
    ///
    /// Any [`AcquireError`] from the lock acquisition.
    pub async fn run_exclusive<F, Fut, T>(&self, callback: F) -> Result<T, AcquireError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.run_exclusive_with_priority(0, callback).await
    }

    /// [`run_exclusive`](Self::run_exclusive) at the given priority.
    ///
    /// # Errors
    ///
    /// Any [`AcquireError`] from the lock acquisition.
    pub async fn run_exclusive_with_priority<F, Fut, T>(
        &self,
        priority: i64,
        callback: F,
    ) -> Result<T, AcquireError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut releaser = self.acquire_with_priority(priority).await?;
        let result = callback().await;
        releaser.release();
        Ok(result)
    }

    /// Waits until the mutex could be locked, without locking it.
    pub fn wait_for_unlock(&self) -> WaitForUnlock {
        self.semaphore.wait_for_unlock()
    }

    /// [`wait_for_unlock`](Self::wait_for_unlock) at the given priority.
    pub fn wait_for_unlock_with_priority(&self, priority: i64) -> WaitForUnlock {
        self.semaphore.wait_for_unlock_with_priority(1, priority)
    }

    /// Returns true while the mutex is held.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.semaphore.is_locked()
    }

    /// Returns the single slot.
    ///
    /// Holders of a [`Releaser`] should use it instead; this exists for the
    /// lineage's unscoped release style.
    pub fn release(&self) {
        internal::release_one(&self.semaphore);
    }

    /// Rejects every queued lock request with this mutex's cancel reason.
    pub fn cancel(&self) {
        self.semaphore.cancel();
    }

    /// Wraps this mutex's engine in a deadline decorator on the shared
    /// wall-clock timer. Acquire through the decorator with weight 1.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> WithTimeout {
        with_timeout(self.semaphore.clone(), timeout)
    }

    /// [`with_timeout`](Self::with_timeout) on an explicit timer.
    #[must_use]
    pub fn with_timeout_on(&self, timeout: Duration, timer: Arc<dyn Timer>) -> WithTimeout {
        with_timeout_on(self.semaphore.clone(), timeout, timer)
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`Mutex::acquire`]; the previous-value half of the
/// underlying grant is dropped.
#[derive(Debug)]
pub struct Lock {
    inner: Acquire,
}

impl Future for Lock {
    type Output = Result<Releaser, AcquireError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().inner)
            .poll(cx)
            .map(|outcome| outcome.map(|(_, releaser)| releaser))
    }
}
