//! Blocking primitives whose waits can be cut short by `close()`.
//!
//! Every wait in the game goes through one of these so that terminating a
//! player or the dealer releases it immediately instead of at the next poll.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// The primitive was closed; nothing more will be delivered.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("closed")]
pub struct Closed;

/// Outcome of a non-blocking push.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TryPushError {
    #[error("queue is full")]
    Full,
    #[error("queue is closed")]
    Closed,
}

fn relock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// FIFO with a fixed capacity. `push` blocks while full, `pop` while empty.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState { items: VecDeque::with_capacity(capacity), closed: false }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        relock(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for room, then append. Fails once the queue is closed.
    pub fn push(&self, item: T) -> Result<(), Closed> {
        let mut st = relock(&self.state);
        while !st.closed && st.items.len() >= self.capacity {
            st = self.not_full.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
        if st.closed {
            return Err(Closed);
        }
        st.items.push_back(item);
        drop(st);
        self.not_empty.notify_one();
        Ok(())
    }

    pub fn try_push(&self, item: T) -> Result<(), TryPushError> {
        let mut st = relock(&self.state);
        if st.closed {
            return Err(TryPushError::Closed);
        }
        if st.items.len() >= self.capacity {
            return Err(TryPushError::Full);
        }
        st.items.push_back(item);
        drop(st);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Wait for an item. `None` once the queue is closed.
    pub fn pop(&self) -> Option<T> {
        let mut st = relock(&self.state);
        loop {
            if st.closed {
                return None;
            }
            if let Some(item) = st.items.pop_front() {
                drop(st);
                self.not_full.notify_one();
                return Some(item);
            }
            st = self.not_empty.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wake every waiter; pending items are dropped.
    pub fn close(&self) {
        let mut st = relock(&self.state);
        st.closed = true;
        st.items.clear();
        drop(st);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        relock(&self.state).closed
    }
}

#[derive(Debug)]
struct LatchState<T> {
    value: Option<T>,
    closed: bool,
}

/// A single-value signal. The waiter arms it, hands the request to someone
/// else and waits; the other side resolves it exactly once. A value set
/// before the waiter arrives is kept, so no wake-up is lost.
#[derive(Debug)]
pub struct Latch<T> {
    state: Mutex<LatchState<T>>,
    ready: Condvar,
}

impl<T> Default for Latch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Latch<T> {
    pub fn new() -> Self {
        Self { state: Mutex::new(LatchState { value: None, closed: false }), ready: Condvar::new() }
    }

    /// Discard any stale value before a new request.
    pub fn arm(&self) {
        relock(&self.state).value = None;
    }

    /// Store `value` and wake the waiter. Returns false if a value was
    /// already pending or the latch is closed.
    pub fn resolve(&self, value: T) -> bool {
        let mut st = relock(&self.state);
        if st.closed || st.value.is_some() {
            return false;
        }
        st.value = Some(value);
        drop(st);
        self.ready.notify_all();
        true
    }

    /// Wait for the value. `None` if the latch is closed first.
    pub fn wait(&self) -> Option<T> {
        let mut st = relock(&self.state);
        loop {
            if let Some(v) = st.value.take() {
                return Some(v);
            }
            if st.closed {
                return None;
            }
            st = self.ready.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut st = relock(&self.state);
        loop {
            if let Some(v) = st.value.take() {
                return Some(v);
            }
            let now = Instant::now();
            if st.closed || now >= deadline {
                return None;
            }
            st = self
                .ready
                .wait_timeout(st, deadline - now)
                .map(|(g, _)| g)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }

    pub fn close(&self) {
        relock(&self.state).closed = true;
        self.ready.notify_all();
    }
}
