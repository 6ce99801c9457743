//! Error types for the semaphore engine and its decorators.
//!
//! Error handling follows these principles:
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - Argument errors are raised synchronously, before anything is queued
//! - Cancellation and timeout carry a configurable [`CancelReason`] so
//!   callers can tell instances (and channels) apart
//!
//! The acquisition queue and the unlock-waiter queue are independent error
//! channels: [`Semaphore::cancel`](crate::Semaphore::cancel) rejects queued
//! acquires with the acquire reason, while
//! [`Semaphore::cancel_unlock_waiters`](crate::Semaphore::cancel_unlock_waiters)
//! rejects unlock waiters with a separately configured reason.

use std::fmt;
use std::sync::Arc;

/// A cheap-to-clone, comparable reason attached to cancellation and timeout
/// errors.
///
/// Every semaphore carries two of these (one per error channel); a timeout
/// decorator carries a third. Overriding a reason makes errors from that
/// instance distinguishable from the library defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReason {
    message: Arc<str>,
}

impl CancelReason {
    /// Creates a reason with a custom message.
    pub fn new(message: impl Into<Arc<str>>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Default reason delivered to queued acquires on
    /// [`cancel`](crate::Semaphore::cancel).
    #[must_use]
    pub fn acquire_default() -> Self {
        Self::new("request for lock canceled")
    }

    /// Default reason delivered to unlock waiters on
    /// [`cancel_unlock_waiters`](crate::Semaphore::cancel_unlock_waiters).
    #[must_use]
    pub fn unlock_default() -> Self {
        Self::new("wait for unlock canceled")
    }

    /// Default reason delivered by a timeout decorator when its deadline
    /// elapses first.
    #[must_use]
    pub fn timeout_default() -> Self {
        Self::new("timeout while waiting for lock to become available")
    }

    /// The reason message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Error for a non-positive weight passed to any weighted operation.
///
/// Raised synchronously; the request is never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidWeight {
    weight: i64,
}

impl InvalidWeight {
    pub(crate) const fn new(weight: i64) -> Self {
        Self { weight }
    }

    /// The rejected weight.
    #[must_use]
    pub const fn weight(&self) -> i64 {
        self.weight
    }
}

impl fmt::Display for InvalidWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid weight {}: must be positive", self.weight)
    }
}

impl std::error::Error for InvalidWeight {}

/// Error returned when an acquisition fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    /// A non-positive weight was passed.
    InvalidWeight(InvalidWeight),
    /// The request was still queued when [`cancel`](crate::Semaphore::cancel)
    /// ran.
    Canceled(CancelReason),
    /// A timeout decorator's deadline elapsed before the grant.
    ///
    /// The bare engine never produces this variant.
    TimedOut(CancelReason),
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWeight(e) => e.fmt(f),
            Self::Canceled(reason) => write!(f, "acquire canceled: {reason}"),
            Self::TimedOut(reason) => write!(f, "acquire timed out: {reason}"),
        }
    }
}

impl std::error::Error for AcquireError {}

impl From<InvalidWeight> for AcquireError {
    fn from(e: InvalidWeight) -> Self {
        Self::InvalidWeight(e)
    }
}

/// Error returned when waiting for unlockability fails.
///
/// Same shape as [`AcquireError`], but on the independent unlock-waiter
/// channel: it is produced by
/// [`cancel_unlock_waiters`](crate::Semaphore::cancel_unlock_waiters), never
/// by [`cancel`](crate::Semaphore::cancel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockWaitError {
    /// A non-positive weight was passed.
    InvalidWeight(InvalidWeight),
    /// The waiter was still queued when `cancel_unlock_waiters` ran.
    Canceled(CancelReason),
    /// A timeout decorator's deadline elapsed before the signal.
    TimedOut(CancelReason),
}

impl fmt::Display for UnlockWaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWeight(e) => e.fmt(f),
            Self::Canceled(reason) => write!(f, "wait for unlock canceled: {reason}"),
            Self::TimedOut(reason) => write!(f, "wait for unlock timed out: {reason}"),
        }
    }
}

impl std::error::Error for UnlockWaitError {}

impl From<InvalidWeight> for UnlockWaitError {
    fn from(e: InvalidWeight) -> Self {
        Self::InvalidWeight(e)
    }
}

/// Error returned when a fail-fast acquisition cannot be granted
/// synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryAcquireError {
    /// A non-positive weight was passed.
    InvalidWeight(InvalidWeight),
    /// The request would have to queue.
    AlreadyLocked,
}

impl fmt::Display for TryAcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWeight(e) => e.fmt(f),
            Self::AlreadyLocked => write!(f, "already locked"),
        }
    }
}

impl std::error::Error for TryAcquireError {}

impl From<InvalidWeight> for TryAcquireError {
    fn from(e: InvalidWeight) -> Self {
        Self::InvalidWeight(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_reason_equality_tracks_message() {
        let a = CancelReason::new("stop");
        let b = CancelReason::new("stop");
        let c = CancelReason::acquire_default();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.message(), "stop");
    }

    #[test]
    fn defaults_are_distinct_channels() {
        assert_ne!(
            CancelReason::acquire_default(),
            CancelReason::unlock_default()
        );
        assert_ne!(
            CancelReason::acquire_default(),
            CancelReason::timeout_default()
        );
    }

    #[test]
    fn invalid_weight_display() {
        let e = InvalidWeight::new(-3);
        assert_eq!(e.weight(), -3);
        assert_eq!(e.to_string(), "invalid weight -3: must be positive");
    }

    #[test]
    fn acquire_error_display_and_conversion() {
        let invalid: AcquireError = InvalidWeight::new(0).into();
        assert!(invalid.to_string().contains("invalid weight 0"));

        let canceled = AcquireError::Canceled(CancelReason::acquire_default());
        assert!(canceled.to_string().contains("canceled"));

        let timed_out = AcquireError::TimedOut(CancelReason::timeout_default());
        assert!(timed_out.to_string().contains("timed out"));
    }

    #[test]
    fn try_acquire_error_display() {
        assert_eq!(TryAcquireError::AlreadyLocked.to_string(), "already locked");
    }
}
