//! Deadline min-heap backing both timers.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::task::Waker;

use super::Time;

#[derive(Debug)]
struct TimerEntry {
    deadline: Time,
    generation: u64,
    waker: Waker,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.generation == other.generation
    }
}

impl Eq for TimerEntry {}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest deadline first); the
        // generation keeps same-deadline pops in insertion order.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.generation.cmp(&self.generation))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A min-heap of `(deadline, waker)` pairs ordered by deadline.
#[derive(Debug, Default)]
pub struct TimerHeap {
    heap: BinaryHeap<TimerEntry>,
    next_generation: u64,
}

impl TimerHeap {
    /// Creates a new empty timer heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of armed wakeups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if no wakeups are armed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Arms a wakeup for the given deadline.
    pub fn insert(&mut self, deadline: Time, waker: Waker) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.heap.push(TimerEntry {
            deadline,
            generation,
            waker,
        });
    }

    /// Returns the earliest armed deadline, if any.
    #[must_use]
    pub fn peek_deadline(&self) -> Option<Time> {
        self.heap.peek().map(|e| e.deadline)
    }

    /// Pops every waker whose deadline is `<= now` (inclusive).
    pub fn pop_expired(&mut self, now: Time) -> Vec<Waker> {
        let mut expired = Vec::with_capacity(4);
        while let Some(entry) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }
            if let Some(entry) = self.heap.pop() {
                expired.push(entry.waker);
            }
        }
        expired
    }

    /// Disarms all wakeups.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
