//! Deadline plumbing for the timeout decorator.
//!
//! The decorator races an operation against a deadline. Deadlines are
//! expressed on a monotonic [`Time`] axis served by a [`Timer`]: the
//! wall-clock [`ThreadTimer`] for production use, or the virtual
//! [`ManualTimer`] for deterministic tests where the caller advances time
//! explicitly.
//!
//! # Example
//!
//! ```
//! use fairsem::time::{ManualTimer, Time, Timer};
//! use std::time::Duration;
//!
//! let timer = ManualTimer::new();
//! assert_eq!(timer.now(), Time::ZERO);
//! timer.advance(Duration::from_millis(150));
//! assert_eq!(timer.now(), Time::from_millis(150));
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

mod heap;
mod manual;
mod thread;

pub use heap::TimerHeap;
pub use manual::ManualTimer;
pub use thread::ThreadTimer;

/// A monotonic instant in nanoseconds since the timer's epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Time(u64);

impl Time {
    /// The timer epoch.
    pub const ZERO: Self = Self(0);

    /// Creates a time from nanoseconds since the epoch.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Creates a time from milliseconds since the epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Creates a time from seconds since the epoch.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000_000_000))
    }

    /// Nanoseconds since the epoch.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Whole milliseconds since the epoch.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0 / 1_000_000
    }

    /// Adds nanoseconds, saturating at the far end of the axis.
    #[must_use]
    pub const fn saturating_add_nanos(self, nanos: u64) -> Self {
        Self(self.0.saturating_add(nanos))
    }

    /// Adds a [`Duration`], saturating at the far end of the axis.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        self.saturating_add_nanos(duration_to_nanos(duration))
    }

    /// Time remaining until `deadline`, or zero if it has passed.
    #[must_use]
    pub fn remaining_until(self, deadline: Time) -> Duration {
        Duration::from_nanos(deadline.0.saturating_sub(self.0))
    }
}

pub(crate) fn duration_to_nanos(duration: Duration) -> u64 {
    duration.as_nanos().min(u128::from(u64::MAX)) as u64
}

/// A source of monotonic time and deadline wakeups.
///
/// `register` arms a one-shot wakeup: the waker is invoked once `now()`
/// reaches the deadline. Registering an already-passed deadline wakes
/// immediately. Stale registrations (the future completed another way) fire
/// as spurious wakes, which pollers must tolerate anyway.
pub trait Timer: Send + Sync {
    /// The current time on this timer's axis.
    fn now(&self) -> Time;

    /// Wakes `waker` once `now()` reaches `deadline`.
    fn register(&self, deadline: Time, waker: &Waker);
}

/// Future that completes once a [`Timer`] reaches a deadline.
pub struct Sleep {
    timer: Arc<dyn Timer>,
    deadline: Time,
    registered: Option<Waker>,
}

impl Sleep {
    /// Creates a sleep completing at `deadline`.
    #[must_use]
    pub fn new(timer: Arc<dyn Timer>, deadline: Time) -> Self {
        Self {
            timer,
            deadline,
            registered: None,
        }
    }

    /// Creates a sleep completing `duration` from the timer's current time.
    #[must_use]
    pub fn after(timer: Arc<dyn Timer>, duration: Duration) -> Self {
        let deadline = timer.now().saturating_add(duration);
        Self::new(timer, deadline)
    }

    /// The deadline this sleep completes at.
    #[must_use]
    pub fn deadline(&self) -> Time {
        self.deadline
    }
}

impl std::fmt::Debug for Sleep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sleep")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.timer.now() >= this.deadline {
            return Poll::Ready(());
        }
        // Re-register only when the waker changed; duplicate heap entries
        // from task migration are woken spuriously and are harmless.
        let stale = this
            .registered
            .as_ref()
            .is_none_or(|w| !w.will_wake(cx.waker()));
        if stale {
            this.timer.register(this.deadline, cx.waker());
            this.registered = Some(cx.waker().clone());
        }
        Poll::Pending
    }
}
