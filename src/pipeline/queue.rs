//! Blocking handoff queue between two pipeline stages
//!
//! A `HandoffQueue` moves ownership of units from one stage thread to the next.
//! The consumer blocks in [`HandoffQueue::wait_and_pop`] until a unit arrives or
//! the queue is stopped; a stopped queue keeps handing out what it still holds
//! and only then reports `None`, which is how a stage learns its input ended.
//!
//! The baseline queue is unbounded and `push` never blocks. A bounded queue can
//! be built with an [`OverflowPolicy`] for deployments that need backpressure.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// Determines what a bounded queue does when it is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Block the producer until the consumer makes room (or the queue stops)
    #[default]
    Block,
    /// Evict the oldest queued unit and hand it back to the producer
    DropOldest,
    /// Refuse the new unit and hand it back to the producer
    DropNewest,
}

/// Result of a [`HandoffQueue::push`]
///
/// Units that did not end up in the queue are returned to the caller, never
/// dropped silently.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub enum PushOutcome<T> {
    /// The unit was appended at the tail
    Queued,
    /// The unit was appended and the returned oldest unit was evicted
    Evicted(T),
    /// The queue was full and the returned unit was not accepted
    Rejected(T),
}

impl<T> PushOutcome<T> {
    /// Unit that was pushed out of the pipeline by this push, if any
    pub fn into_dropped(self) -> Option<T> {
        match self {
            PushOutcome::Queued => None,
            PushOutcome::Evicted(unit) | PushOutcome::Rejected(unit) => Some(unit),
        }
    }
}

#[derive(Debug)]
struct Inner<T> {
    items: VecDeque<T>,
    stopped: bool,
}

/// FIFO queue with blocking pop and an explicit stop signal
#[derive(Debug)]
pub struct HandoffQueue<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: Option<usize>,
    policy: OverflowPolicy,
}

impl<T> HandoffQueue<T> {
    /// Create an unbounded queue; `push` never blocks
    pub fn new() -> Self {
        Self::with_limit(None, OverflowPolicy::Block)
    }

    /// Create a queue holding at most `capacity` units (minimum 1)
    pub fn bounded(capacity: usize, policy: OverflowPolicy) -> Self {
        Self::with_limit(Some(capacity.max(1)), policy)
    }

    /// Create a queue from an optional capacity, as found in the configuration
    pub fn with_limit(capacity: Option<usize>, policy: OverflowPolicy) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                stopped: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: capacity.map(|c| c.max(1)),
            policy,
        }
    }

    // Every critical section is a single VecDeque operation or a flag write, so
    // the data behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a unit at the tail and wake one blocked consumer.
    ///
    /// Pushing after `stop()` is accepted, but nothing guarantees the unit is
    /// ever consumed. A producer must not push after it stopped the queue itself.
    pub fn push(&self, unit: T) -> PushOutcome<T> {
        let mut inner = self.lock();
        let mut outcome = PushOutcome::Queued;

        if let Some(capacity) = self.capacity {
            if inner.items.len() >= capacity && !inner.stopped {
                match self.policy {
                    OverflowPolicy::Block => {
                        while inner.items.len() >= capacity && !inner.stopped {
                            inner = self
                                .not_full
                                .wait(inner)
                                .unwrap_or_else(PoisonError::into_inner);
                        }
                    }
                    OverflowPolicy::DropOldest => {
                        if let Some(oldest) = inner.items.pop_front() {
                            outcome = PushOutcome::Evicted(oldest);
                        }
                    }
                    OverflowPolicy::DropNewest => return PushOutcome::Rejected(unit),
                }
            }
        }

        inner.items.push_back(unit);
        drop(inner);
        self.not_empty.notify_one();
        outcome
    }

    /// Block until a unit is available or the queue is stopped.
    ///
    /// Queued units are returned in FIFO order even after `stop()`. `None` means
    /// the queue is stopped and empty: no more data will ever arrive.
    pub fn wait_and_pop(&self) -> Option<T> {
        let mut inner = self.lock();
        loop {
            if let Some(unit) = inner.items.pop_front() {
                drop(inner);
                if self.capacity.is_some() {
                    self.not_full.notify_one();
                }
                return Some(unit);
            }
            if inner.stopped {
                return None;
            }
            inner = self
                .not_empty
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Pop the head unit without blocking
    pub fn try_pop(&self) -> Option<T> {
        let unit = self.lock().items.pop_front();
        if unit.is_some() && self.capacity.is_some() {
            self.not_full.notify_one();
        }
        unit
    }

    /// Mark the queue stopped and wake every blocked consumer and producer.
    ///
    /// Idempotent. Units already queued stay retrievable until drained.
    pub fn stop(&self) {
        {
            let mut inner = self.lock();
            inner.stopped = true;
        }
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Maximum number of queued units, `None` for an unbounded queue
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}

impl<T> Default for HandoffQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
