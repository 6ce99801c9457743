//! Wall-clock timer backed by a parked worker thread.

use parking_lot::{Condvar, Mutex as ParkingMutex};
use std::sync::{Arc, OnceLock, Weak};
use std::task::Waker;
use std::time::{Duration, Instant};

use super::{duration_to_nanos, Time, Timer, TimerHeap};

/// Longest the worker parks while idle, so a dropped timer's thread exits
/// promptly instead of parking forever.
const IDLE_PARK: Duration = Duration::from_secs(1);

/// A [`Timer`] driven by the wall clock.
///
/// Deadlines are serviced by one detached worker thread that parks on a
/// condvar until the earliest armed deadline. Most callers want the
/// process-wide [`shared`](ThreadTimer::shared) instance; per-instance
/// timers exist for isolation in long-running services.
pub struct ThreadTimer {
    start: Instant,
    state: ParkingMutex<TimerHeap>,
    wakeup: Condvar,
}

impl std::fmt::Debug for ThreadTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadTimer")
            .field("armed", &self.state.lock().len())
            .finish_non_exhaustive()
    }
}

impl ThreadTimer {
    /// Creates a timer and spawns its worker thread.
    #[must_use]
    pub fn new() -> Arc<Self> {
        let timer = Arc::new(Self {
            start: Instant::now(),
            state: ParkingMutex::new(TimerHeap::new()),
            wakeup: Condvar::new(),
        });
        let weak = Arc::downgrade(&timer);
        std::thread::Builder::new()
            .name("fairsem-timer".into())
            .spawn(move || worker(&weak))
            .expect("failed to spawn timer thread");
        timer
    }

    /// The process-wide timer instance, created on first use.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<ThreadTimer>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(Self::new))
    }
}

impl Timer for ThreadTimer {
    fn now(&self) -> Time {
        Time::from_nanos(duration_to_nanos(self.start.elapsed()))
    }

    fn register(&self, deadline: Time, waker: &Waker) {
        if deadline <= self.now() {
            waker.wake_by_ref();
            return;
        }
        {
            let mut heap = self.state.lock();
            heap.insert(deadline, waker.clone());
        }
        self.wakeup.notify_one();
    }
}

fn worker(timer: &Weak<ThreadTimer>) {
    loop {
        // Hold a strong reference only for one servicing round; once the
        // last external handle is gone the upgrade fails and the thread exits.
        let Some(this) = timer.upgrade() else { return };

        let now = this.now();
        let expired = {
            let mut heap = this.state.lock();
            heap.pop_expired(now)
        };
        for waker in expired {
            waker.wake();
        }

        let mut heap = this.state.lock();
        let park = heap
            .peek_deadline()
            .map_or(IDLE_PARK, |deadline| this.now().remaining_until(deadline))
            .min(IDLE_PARK);
        if park > Duration::ZERO {
            let _ = this.wakeup.wait_for(&mut heap, park);
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
    fn now_is_monotonic() {
        init_test("now_is_monotonic");
        let timer = ThreadTimer::new();
        let a = timer.now();
        let b = timer.now();
        crate::assert_with_log!(b >= a, "now monotonic", true, b >= a);
        crate::test_complete!("now_is_monotonic");
    }

    #[test]
    fn register_past_deadline_wakes_immediately() {
        init_test("register_past_deadline_wakes_immediately");
        let timer = ThreadTimer::new();
        let counting = CountingWaker::new();
        timer.register(Time::ZERO, &Waker::from(Arc::clone(&counting)));
        crate::assert_with_log!(
            counting.count() == 1,
            "woken immediately",
            1usize,
            counting.count()
        );
        crate::test_complete!("register_past_deadline_wakes_immediately");
    }

    #[test]
    fn worker_wakes_at_deadline() {
        init_test("worker_wakes_at_deadline");
        let timer = ThreadTimer::new();
        let counting = CountingWaker::new();
        let deadline = timer.now().saturating_add(Duration::from_millis(20));
        timer.register(deadline, &Waker::from(Arc::clone(&counting)));

        let waited = Instant::now();
        while counting.count() == 0 && waited.elapsed() < Duration::from_secs(2) {
            std::thread::sleep(Duration::from_millis(5));
        }
        crate::assert_with_log!(counting.count() > 0, "woken by worker", true, counting.count() > 0);
        crate::test_complete!("worker_wakes_at_deadline");
    }
}
