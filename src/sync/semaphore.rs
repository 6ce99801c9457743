//! Weighted, priority-aware semaphore.
//!
//! The semaphore owns a signed capacity counter and two queues: the
//! acquisition queue (descending priority, FIFO among equals) and the
//! unlock-waiter buckets (observers that never consume capacity). All
//! scheduling decisions — admission, dispatch, draining observers — run to
//! completion inside one state lock, and wakers are only invoked after the
//! lock is released.
//!
//! # Queue discipline
//!
//! A request is granted without queueing only when its priority is strictly
//! higher than every queued request's and its weight fits the current value.
//! Everything else queues; dispatch is an iterative sweep that pops the head
//! while it fits, so a long queue never grows the call stack.
//!
//! # Cancel Safety
//!
//! Dropping a pending [`Acquire`] or [`WaitForUnlock`] future withdraws its
//! entry. A grant that landed just before the drop is returned automatically
//! when the contained [`Releaser`] drops, so capacity cannot leak through
//! abandonment.
//!
//! # Example
//!
//! ```ignore
//! use fairsem::Semaphore;
//!
//! let sem = Semaphore::new(4);
//!
//! // Consume 3 of the 4 slots; `previous` is the value before the grant.
//! let (previous, releaser) = sem.acquire_weighted(3).await?;
//! assert_eq!(previous, 4);
//!
//! // Capacity returns when the releaser is released or dropped.
//! drop(releaser);
//! ```

use parking_lot::Mutex as ParkingMutex;
use smallvec::SmallVec;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::mem::ManuallyDrop;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use crate::error::{
    AcquireError, CancelReason, InvalidWeight, TryAcquireError, UnlockWaitError,
};

/// Wakers collected under the state lock, invoked after it is released.
type WakeBatch = SmallVec<[Waker; 4]>;

/// A successful grant: the value before the grant and the capability that
/// returns the weight.
pub type Grant = (i64, Releaser);

/// One-shot completion slot shared between the engine and a pending future.
///
/// The engine fulfills it under the state lock; the future only ever locks
/// the slot itself. Lock order is always state before slot.
struct Ticket<T> {
    slot: ParkingMutex<TicketSlot<T>>,
}

struct TicketSlot<T> {
    outcome: Option<T>,
    waker: Option<Waker>,
}

impl<T> Ticket<T> {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            slot: ParkingMutex::new(TicketSlot {
                outcome: None,
                waker: None,
            }),
        })
    }

    /// A ticket settled before its future is ever polled (synchronous grant
    /// or synchronous argument error).
    fn settled(outcome: T) -> Arc<Self> {
        Arc::new(Self {
            slot: ParkingMutex::new(TicketSlot {
                outcome: Some(outcome),
                waker: None,
            }),
        })
    }

    /// Stores the outcome; any registered waker joins the wake batch.
    fn fulfill(&self, outcome: T, wake: &mut WakeBatch) {
        let mut slot = self.slot.lock();
        slot.outcome = Some(outcome);
        if let Some(waker) = slot.waker.take() {
            wake.push(waker);
        }
    }

    fn take(&self) -> Option<T> {
        self.slot.lock().outcome.take()
    }

    /// Takes the outcome if settled, otherwise registers `waker`.
    fn take_or_register(&self, waker: &Waker) -> Option<T> {
        let mut slot = self.slot.lock();
        if let Some(outcome) = slot.outcome.take() {
            return Some(outcome);
        }
        let stale = slot
            .waker
            .as_ref()
            .is_none_or(|existing| !existing.will_wake(waker));
        if stale {
            slot.waker = Some(waker.clone());
        }
        None
    }
}

impl<T> fmt::Debug for Ticket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket").finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct QueueEntry {
    weight: i64,
    priority: i64,
    ticket: Arc<Ticket<Result<Grant, AcquireError>>>,
}

#[derive(Debug)]
struct UnlockWaiter {
    priority: i64,
    ticket: Arc<Ticket<Result<(), UnlockWaitError>>>,
}

#[derive(Debug)]
struct SemState {
    /// Signed capacity; negative values model over-subscription.
    value: i64,
    /// Pending acquisitions, descending priority, FIFO among equals.
    queue: VecDeque<QueueEntry>,
    /// Unlock observers bucketed by the weight they are watching for.
    unlock_waiters: BTreeMap<i64, VecDeque<UnlockWaiter>>,
}

#[derive(Debug)]
struct Shared {
    state: ParkingMutex<SemState>,
    cancel_reason: CancelReason,
    unlock_cancel_reason: CancelReason,
    initial_value: i64,
}

/// A weighted, priority-aware async semaphore.
///
/// Cloning returns another handle to the same semaphore.
///
/// The value may be driven negative (by [`set_value`](Self::set_value) or a
/// negative initial value) to model a pool that must be repaid before any
/// grant happens.
#[derive(Debug, Clone)]
pub struct Semaphore {
    shared: Arc<Shared>,
}

impl Semaphore {
    /// Creates a semaphore with the given initial value.
    ///
    /// The value is not validated: zero and negative pools are legal and
    /// simply start locked.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self::with_cancel_reasons(
            value,
            CancelReason::acquire_default(),
            CancelReason::unlock_default(),
        )
    }

    /// Creates a semaphore with custom cancellation reasons for the two
    /// error channels.
    #[must_use]
    pub fn with_cancel_reasons(
        value: i64,
        cancel_reason: CancelReason,
        unlock_cancel_reason: CancelReason,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: ParkingMutex::new(SemState {
                    value,
                    queue: VecDeque::new(),
                    unlock_waiters: BTreeMap::new(),
                }),
                cancel_reason,
                unlock_cancel_reason,
                initial_value: value,
            }),
        }
    }

    /// Acquires weight 1 at priority 0.
    pub fn acquire(&self) -> Acquire {
        self.acquire_with_priority(1, 0)
    }

    /// Acquires the given weight at priority 0.
    pub fn acquire_weighted(&self, weight: i64) -> Acquire {
        self.acquire_with_priority(weight, 0)
    }

    /// Acquires the given weight at the given priority.
    ///
    /// Resolves to `(previous_value, releaser)` once granted. Grants happen
    /// without queueing only for requests whose priority is strictly higher
    /// than every queued request's and whose weight fits; all other requests
    /// queue in descending-priority order with FIFO tie-break.
    ///
    /// A non-positive weight settles the future immediately with
    /// [`AcquireError::InvalidWeight`]; nothing is queued.
    pub fn acquire_with_priority(&self, weight: i64, priority: i64) -> Acquire {
        if weight <= 0 {
            return Acquire {
                shared: Arc::clone(&self.shared),
                ticket: Ticket::settled(Err(InvalidWeight::new(weight).into())),
                queued: false,
                done: false,
            };
        }

        let ticket = Ticket::new();
        let mut wake = WakeBatch::new();
        let queued;
        {
            let mut state = self.shared.state.lock();
            // Insertion point: after the last queued entry of greater or
            // equal priority (stable FIFO among equals).
            let position = state
                .queue
                .iter()
                .rposition(|entry| entry.priority >= priority)
                .map_or(0, |index| index + 1);
            if position == 0 && weight <= state.value {
                // Strictly highest priority and the weight fits: grant now,
                // the queue is never touched.
                let previous = state.value;
                state.value -= weight;
                tracing::trace!(weight, priority, previous, "acquire granted immediately");
                ticket.fulfill(
                    Ok((previous, Releaser::new(Arc::clone(&self.shared), weight))),
                    &mut wake,
                );
                queued = false;
            } else {
                state.queue.insert(
                    position,
                    QueueEntry {
                        weight,
                        priority,
                        ticket: Arc::clone(&ticket),
                    },
                );
                queued = true;
            }
            // Every mutation ends with one sweep; insertion can only make
            // entries dispatchable through it, never out of order.
            dispatch_queue(&self.shared, &mut state, &mut wake);
        }
        wake_all(wake);

        Acquire {
            shared: Arc::clone(&self.shared),
            ticket,
            queued,
            done: false,
        }
    }

    /// Fail-fast acquisition of weight 1 at priority 0.
    ///
    /// # Errors
    ///
    /// [`TryAcquireError::AlreadyLocked`] if the grant would have to queue.
    pub fn try_acquire(&self) -> Result<Grant, TryAcquireError> {
        self.try_acquire_with_priority(1, 0)
    }

    /// Fail-fast acquisition of the given weight at priority 0.
    ///
    /// # Errors
    ///
    /// See [`try_acquire_with_priority`](Self::try_acquire_with_priority).
    pub fn try_acquire_weighted(&self, weight: i64) -> Result<Grant, TryAcquireError> {
        self.try_acquire_with_priority(weight, 0)
    }

    /// Fail-fast acquisition: grants only under the same condition as an
    /// immediate [`acquire_with_priority`](Self::acquire_with_priority)
    /// grant, and never queues.
    ///
    /// # Errors
    ///
    /// [`TryAcquireError::InvalidWeight`] for a non-positive weight,
    /// [`TryAcquireError::AlreadyLocked`] if the grant would have to queue.
    pub fn try_acquire_with_priority(
        &self,
        weight: i64,
        priority: i64,
    ) -> Result<Grant, TryAcquireError> {
        if weight <= 0 {
            return Err(InvalidWeight::new(weight).into());
        }
        let mut wake = WakeBatch::new();
        let result = {
            let mut state = self.shared.state.lock();
            if could_lock_immediately(&state, weight, priority) {
                let previous = state.value;
                state.value -= weight;
                dispatch_queue(&self.shared, &mut state, &mut wake);
                Ok((previous, Releaser::new(Arc::clone(&self.shared), weight)))
            } else {
                Err(TryAcquireError::AlreadyLocked)
            }
        };
        wake_all(wake);
        result
    }

    /// Runs `callback` while holding weight 1 at priority 0.
    ///
    /// # Errors
    ///
    /// See [`run_exclusive_with_priority`](Self::run_exclusive_with_priority).
    pub async fn run_exclusive<F, Fut, T>(&self, callback: F) -> Result<T, AcquireError>
    where
        F: FnOnce(i64) -> Fut,
        Fut: Future<Output = T>,
    {
        self.run_exclusive_with_priority(1, 0, callback).await
    }

    /// Runs `callback` while holding the given weight at priority 0.
    ///
    /// # Errors
    ///
    /// See [`run_exclusive_with_priority`](Self::run_exclusive_with_priority).
    pub async fn run_exclusive_weighted<F, Fut, T>(
        &self,
        weight: i64,
        callback: F,
    ) -> Result<T, AcquireError>
    where
        F: FnOnce(i64) -> Fut,
        Fut: Future<Output = T>,
    {
        self.run_exclusive_with_priority(weight, 0, callback).await
    }

    /// Acquires, invokes `callback` with the pre-grant value, and releases
    /// the weight on every exit path — normal return, callback panic, or the
    /// surrounding future being dropped mid-callback.
    ///
    /// The callback's output is returned unchanged.
    ///
    /// # Errors
    ///
    /// Any [`AcquireError`] from the acquisition itself.
    pub async fn run_exclusive_with_priority<F, Fut, T>(
        &self,
        weight: i64,
        priority: i64,
        callback: F,
    ) -> Result<T, AcquireError>
    where
        F: FnOnce(i64) -> Fut,
        Fut: Future<Output = T>,
    {
        let (previous, mut releaser) = self.acquire_with_priority(weight, priority).await?;
        let result = callback(previous).await;
        releaser.release();
        Ok(result)
    }

    /// Waits (without consuming capacity) until weight 1 could be locked at
    /// priority 0.
    pub fn wait_for_unlock(&self) -> WaitForUnlock {
        self.wait_for_unlock_with_priority(1, 0)
    }

    /// Waits until the given weight could be locked at priority 0.
    pub fn wait_for_unlock_weighted(&self, weight: i64) -> WaitForUnlock {
        self.wait_for_unlock_with_priority(weight, 0)
    }

    /// Waits until the given weight could be locked at the given priority.
    ///
    /// Resolves immediately when the weight could lock right now (queue
    /// empty or headed by a strictly lower priority, and the weight fits).
    /// Otherwise the waiter parks in its weight bucket until a dispatch
    /// sweep finds the weight reachable under current priority pressure.
    /// Never consumes capacity.
    ///
    /// A non-positive weight settles the future immediately with
    /// [`UnlockWaitError::InvalidWeight`].
    pub fn wait_for_unlock_with_priority(&self, weight: i64, priority: i64) -> WaitForUnlock {
        if weight <= 0 {
            return WaitForUnlock {
                shared: Arc::clone(&self.shared),
                ticket: Ticket::settled(Err(InvalidWeight::new(weight).into())),
                weight,
                queued: false,
                done: false,
            };
        }

        let mut state = self.shared.state.lock();
        let (ticket, queued) = if could_lock_immediately(&state, weight, priority) {
            (Ticket::settled(Ok(())), false)
        } else {
            let ticket = Ticket::new();
            let bucket = state.unlock_waiters.entry(weight).or_default();
            let position = bucket
                .iter()
                .rposition(|waiter| waiter.priority >= priority)
                .map_or(0, |index| index + 1);
            bucket.insert(
                position,
                UnlockWaiter {
                    priority,
                    ticket: Arc::clone(&ticket),
                },
            );
            (ticket, true)
        };
        drop(state);

        WaitForUnlock {
            shared: Arc::clone(&self.shared),
            ticket,
            weight,
            queued,
            done: false,
        }
    }

    /// Returns true while the pool is exhausted (`value <= 0`).
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.shared.state.lock().value <= 0
    }

    /// The current value (raw read).
    #[must_use]
    pub fn value(&self) -> i64 {
        self.shared.state.lock().value
    }

    /// The value the semaphore was constructed with.
    #[must_use]
    pub fn initial_value(&self) -> i64 {
        self.shared.initial_value
    }

    /// Overwrites the value, then dispatches whatever the new value affords.
    pub fn set_value(&self, value: i64) {
        let mut wake = WakeBatch::new();
        {
            let mut state = self.shared.state.lock();
            state.value = value;
            dispatch_queue(&self.shared, &mut state, &mut wake);
        }
        wake_all(wake);
    }

    /// Returns `weight` to the pool, then dispatches.
    ///
    /// Anyone may release; the weight does not have to correspond to a prior
    /// grant. Holders of a [`Releaser`] should use it instead.
    ///
    /// # Errors
    ///
    /// [`InvalidWeight`] for a non-positive weight.
    pub fn release(&self, weight: i64) -> Result<(), InvalidWeight> {
        if weight <= 0 {
            return Err(InvalidWeight::new(weight));
        }
        release_weight(&self.shared, weight);
        Ok(())
    }

    /// Single-slot release for binary semaphores.
    ///
    /// # Panics
    ///
    /// Panics if the semaphore was constructed with capacity greater than 1:
    /// on a weighted pool an unweighted release is a bookkeeping error that
    /// must not be ignored.
    #[deprecated(note = "use the releaser returned by acquire, or release(weight)")]
    pub fn release_single(&self) {
        assert!(
            self.shared.initial_value <= 1,
            "release_single is unavailable on semaphores with capacity > 1; \
             use the releaser returned by acquire instead"
        );
        release_weight(&self.shared, 1);
    }

    /// Rejects every still-queued acquisition with this semaphore's cancel
    /// reason and clears the queue.
    ///
    /// Requests granted before this call — including their releasers — are
    /// unaffected. Unlock waiters are a separate channel; see
    /// [`cancel_unlock_waiters`](Self::cancel_unlock_waiters).
    pub fn cancel(&self) {
        let mut wake = WakeBatch::new();
        {
            let mut state = self.shared.state.lock();
            let drained = std::mem::take(&mut state.queue);
            if !drained.is_empty() {
                tracing::debug!(rejected = drained.len(), "canceling queued acquires");
            }
            for entry in drained {
                entry.ticket.fulfill(
                    Err(AcquireError::Canceled(self.shared.cancel_reason.clone())),
                    &mut wake,
                );
            }
        }
        wake_all(wake);
    }

    /// Rejects every parked unlock waiter with the unlock-cancel reason and
    /// clears the buckets. Queued acquisitions are unaffected.
    pub fn cancel_unlock_waiters(&self) {
        let mut wake = WakeBatch::new();
        {
            let mut state = self.shared.state.lock();
            let buckets = std::mem::take(&mut state.unlock_waiters);
            for (_, bucket) in buckets {
                for waiter in bucket {
                    waiter.ticket.fulfill(
                        Err(UnlockWaitError::Canceled(
                            self.shared.unlock_cancel_reason.clone(),
                        )),
                        &mut wake,
                    );
                }
            }
        }
        wake_all(wake);
    }
}

/// True when a request could be granted right now without queueing: the
/// queue is empty or headed by a strictly lower priority, and the weight
/// fits the current value.
fn could_lock_immediately(state: &SemState, weight: i64, priority: i64) -> bool {
    state
        .queue
        .front()
        .is_none_or(|head| head.priority < priority)
        && weight <= state.value
}

/// The dispatch sweep. Runs after every value change and every insertion:
/// drains unlock waiters, then pops the head while its weight fits,
/// fulfilling each grant and re-draining after every pop.
fn dispatch_queue(shared: &Arc<Shared>, state: &mut SemState, wake: &mut WakeBatch) {
    drain_unlock_waiters(state, wake);
    loop {
        let fits = state
            .queue
            .front()
            .is_some_and(|head| head.weight <= state.value);
        if !fits {
            break;
        }
        let Some(entry) = state.queue.pop_front() else { break };
        let previous = state.value;
        state.value -= entry.weight;
        tracing::trace!(
            weight = entry.weight,
            priority = entry.priority,
            previous,
            "dispatching queued acquire"
        );
        entry.ticket.fulfill(
            Ok((previous, Releaser::new(Arc::clone(shared), entry.weight))),
            wake,
        );
        drain_unlock_waiters(state, wake);
    }
}

/// Signals unlock waiters whose weight is reachable under current priority
/// pressure, largest weight first.
///
/// With an empty queue every waiter whose weight fits is signaled. With a
/// non-empty queue only waiters of strictly higher priority than the queued
/// head are signaled — the head would be served first and could consume the
/// capacity the waiter is checking for — stopping at the first blocked
/// waiter in each bucket.
fn drain_unlock_waiters(state: &mut SemState, wake: &mut WakeBatch) {
    if state.value < 1 {
        return;
    }
    let reachable: SmallVec<[i64; 4]> = state
        .unlock_waiters
        .range(1..=state.value)
        .map(|(weight, _)| *weight)
        .rev()
        .collect();
    let blocking_priority = state.queue.front().map(|head| head.priority);

    for weight in reachable {
        match blocking_priority {
            None => {
                if let Some(bucket) = state.unlock_waiters.remove(&weight) {
                    for waiter in bucket {
                        waiter.ticket.fulfill(Ok(()), wake);
                    }
                }
            }
            Some(blocking) => {
                let Some(bucket) = state.unlock_waiters.get_mut(&weight) else {
                    continue;
                };
                while bucket
                    .front()
                    .is_some_and(|waiter| waiter.priority > blocking)
                {
                    if let Some(waiter) = bucket.pop_front() {
                        waiter.ticket.fulfill(Ok(()), wake);
                    }
                }
                if bucket.is_empty() {
                    state.unlock_waiters.remove(&weight);
                }
            }
        }
    }
}

fn release_weight(shared: &Arc<Shared>, weight: i64) {
    let mut wake = WakeBatch::new();
    {
        let mut state = shared.state.lock();
        state.value += weight;
        dispatch_queue(shared, &mut state, &mut wake);
    }
    wake_all(wake);
}

fn wake_all(wake: WakeBatch) {
    for waker in wake {
        waker.wake();
    }
}

/// One-shot capability returned by a grant; returns exactly the granted
/// weight to the semaphore.
///
/// [`release`](Self::release) may be called any number of times; only the
/// first call has effect. An unreleased releaser releases on drop, which is
/// what makes scoped acquisition and post-timeout cleanup leak-free. Use
/// [`forget`](Self::forget) to leak the capacity deliberately.
#[must_use = "capacity is returned as soon as the releaser is dropped"]
pub struct Releaser {
    shared: Arc<Shared>,
    weight: i64,
    released: bool,
}

impl Releaser {
    fn new(shared: Arc<Shared>, weight: i64) -> Self {
        Self {
            shared,
            weight,
            released: false,
        }
    }

    /// The weight this releaser returns.
    #[must_use]
    pub fn weight(&self) -> i64 {
        self.weight
    }

    /// True once the weight has been returned.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Returns the weight to the semaphore. Idempotent.
    pub fn release(&mut self) {
        if std::mem::replace(&mut self.released, true) {
            return;
        }
        release_weight(&self.shared, self.weight);
    }

    /// Drops the releaser without returning the weight.
    pub fn forget(self) {
        let _ = ManuallyDrop::new(self);
    }
}

impl fmt::Debug for Releaser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Releaser")
            .field("weight", &self.weight)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl Drop for Releaser {
    fn drop(&mut self) {
        self.release();
    }
}

/// Future returned by the acquire methods.
pub struct Acquire {
    shared: Arc<Shared>,
    ticket: Arc<Ticket<Result<Grant, AcquireError>>>,
    /// Whether the request entered the queue (false for synchronous
    /// settlement: immediate grant or invalid weight).
    queued: bool,
    done: bool,
}

impl fmt::Debug for Acquire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acquire")
            .field("queued", &self.queued)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl Future for Acquire {
    type Output = Result<Grant, AcquireError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.ticket.take_or_register(cx.waker()) {
            Some(outcome) => {
                this.done = true;
                Poll::Ready(outcome)
            }
            None => Poll::Pending,
        }
    }
}

impl Drop for Acquire {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if self.queued {
            let mut wake = WakeBatch::new();
            {
                let mut state = self.shared.state.lock();
                if let Some(position) = state
                    .queue
                    .iter()
                    .position(|entry| Arc::ptr_eq(&entry.ticket, &self.ticket))
                {
                    state.queue.remove(position);
                    // Withdrawing a blocking head can make later entries
                    // dispatchable.
                    dispatch_queue(&self.shared, &mut state, &mut wake);
                }
            }
            wake_all(wake);
        }
        // A grant that landed but was never observed returns its capacity
        // when the contained releaser drops. Must run outside the state lock.
        drop(self.ticket.take());
    }
}

/// Future returned by the wait-for-unlock methods.
pub struct WaitForUnlock {
    shared: Arc<Shared>,
    ticket: Arc<Ticket<Result<(), UnlockWaitError>>>,
    weight: i64,
    queued: bool,
    done: bool,
}

impl fmt::Debug for WaitForUnlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitForUnlock")
            .field("weight", &self.weight)
            .field("queued", &self.queued)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl Future for WaitForUnlock {
    type Output = Result<(), UnlockWaitError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.ticket.take_or_register(cx.waker()) {
            Some(outcome) => {
                this.done = true;
                Poll::Ready(outcome)
            }
            None => Poll::Pending,
        }
    }
}

impl Drop for WaitForUnlock {
    fn drop(&mut self) {
        if self.done || !self.queued {
            return;
        }
        let mut state = self.shared.state.lock();
        if let Some(bucket) = state.unlock_waiters.get_mut(&self.weight) {
            if let Some(position) = bucket
                .iter()
                .position(|waiter| Arc::ptr_eq(&waiter.ticket, &self.ticket))
            {
                bucket.remove(position);
            }
            if bucket.is_empty() {
                state.unlock_waiters.remove(&self.weight);
            }
        }
    }
}

pub(crate) mod internal {
    //! Crate-internal hooks for the façades.

    use super::{release_weight, Semaphore};

    /// Infallible weight-1 release used by the mutex façade.
    pub(crate) fn release_one(semaphore: &Semaphore) {
        release_weight(&semaphore.shared, 1);
    }
}
