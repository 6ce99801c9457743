//! Virtual clock for deterministic tests.

use parking_lot::Mutex as ParkingMutex;
use std::sync::Arc;
use std::task::Waker;
use std::time::Duration;

use super::{duration_to_nanos, Time, Timer, TimerHeap};

/// A [`Timer`] whose clock only moves when the caller advances it.
///
/// This is the simulated-time harness: deadline behavior becomes a pure
/// function of explicit `advance` calls, so races between a grant and a
/// timeout can be replayed exactly.
///
/// # Example
///
/// ```
/// use fairsem::time::{ManualTimer, Time, Timer};
/// use std::time::Duration;
///
/// let timer = ManualTimer::new();
/// timer.advance(Duration::from_millis(100));
/// assert_eq!(timer.now(), Time::from_millis(100));
/// ```
#[derive(Debug)]
pub struct ManualTimer {
    inner: ParkingMutex<ManualState>,
}

#[derive(Debug)]
struct ManualState {
    now: Time,
    heap: TimerHeap,
}

impl ManualTimer {
    /// Creates a timer at [`Time::ZERO`].
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::starting_at(Time::ZERO)
    }

    /// Creates a timer at an arbitrary starting instant.
    #[must_use]
    pub fn starting_at(now: Time) -> Arc<Self> {
        Arc::new(Self {
            inner: ParkingMutex::new(ManualState {
                now,
                heap: TimerHeap::new(),
            }),
        })
    }

    /// Moves the clock forward by `duration`, waking every sleep whose
    /// deadline is reached.
    pub fn advance(&self, duration: Duration) {
        let target = self
            .inner
            .lock()
            .now
            .saturating_add_nanos(duration_to_nanos(duration));
        self.advance_to(target);
    }

    /// Moves the clock to `now` (never backwards), waking every sleep whose
    /// deadline is reached.
    pub fn advance_to(&self, now: Time) {
        let expired = {
            let mut state = self.inner.lock();
            if now > state.now {
                state.now = now;
            }
            let now = state.now;
            state.heap.pop_expired(now)
        };
        // Wakers run arbitrary scheduler code; never invoke them under the lock.
        for waker in expired {
            waker.wake();
        }
    }

    /// Number of armed wakeups (diagnostics).
    #[must_use]
    pub fn armed(&self) -> usize {
        self.inner.lock().heap.len()
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> Time {
        self.inner.lock().now
    }

    fn register(&self, deadline: Time, waker: &Waker) {
        let due = {
            let mut state = self.inner.lock();
            if deadline <= state.now {
                true
            } else {
                state.heap.insert(deadline, waker.clone());
                false
            }
        };
        if due {
            waker.wake_by_ref();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_logging, CountingWaker};

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn clock_never_moves_backwards() {
        init_test("clock_never_moves_backwards");
        let timer = ManualTimer::starting_at(Time::from_millis(100));
        timer.advance_to(Time::from_millis(40));
        crate::assert_with_log!(
            timer.now() == Time::from_millis(100),
            "now unchanged",
            Time::from_millis(100),
            timer.now()
        );
        crate::test_complete!("clock_never_moves_backwards");
    }

    #[test]
    fn register_past_deadline_wakes_immediately() {
        init_test("register_past_deadline_wakes_immediately");
        let timer = ManualTimer::starting_at(Time::from_millis(100));
        let counting = CountingWaker::new();
        let waker = Waker::from(Arc::clone(&counting));

        timer.register(Time::from_millis(50), &waker);
        crate::assert_with_log!(
            counting.count() == 1,
            "woken immediately",
            1usize,
            counting.count()
        );
        crate::assert_with_log!(timer.armed() == 0, "nothing armed", 0usize, timer.armed());
        crate::test_complete!("register_past_deadline_wakes_immediately");
    }

    #[test]
    fn advance_wakes_only_due_deadlines() {
        init_test("advance_wakes_only_due_deadlines");
        let timer = ManualTimer::new();
        let early = CountingWaker::new();
        let late = CountingWaker::new();

        timer.register(Time::from_millis(100), &Waker::from(Arc::clone(&early)));
        timer.register(Time::from_millis(200), &Waker::from(Arc::clone(&late)));

        timer.advance(Duration::from_millis(150));
        crate::assert_with_log!(early.count() == 1, "early woken", 1usize, early.count());
        crate::assert_with_log!(late.count() == 0, "late not woken", 0usize, late.count());

        timer.advance(Duration::from_millis(50));
        crate::assert_with_log!(late.count() == 1, "late woken", 1usize, late.count());
        crate::test_complete!("advance_wakes_only_due_deadlines");
    }
}
