//! A bounded FIFO with selectable overflow discipline.
//!
//! Built directly on a `VecDeque` behind a `parking_lot::Mutex` rather than
//! wrapping `tokio::sync::mpsc`, because the sliding discipline needs to
//! evict the oldest buffered item from the producer side, which `mpsc`
//! cannot do. Readiness is signalled with a pair of `tokio::sync::Notify`s.

// Layer 1: Standard library imports
use std::collections::VecDeque;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Notify;

// Layer 3: Internal module imports
// (none)

/// Overflow discipline selected at queue construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Discipline {
    /// Producers wait until space exists.
    #[default]
    Block,
    /// On full, drop the oldest buffered item to admit the new one.
    Sliding,
    /// On full, silently discard the new item.
    Dropping,
}

/// Error returned by the blocking [`BoundedQueue::put`]/[`BoundedQueue::take`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue has been closed.
    #[error("queue is closed")]
    Closed,
}

/// Error returned by [`BoundedQueue::try_put`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TryPutError {
    /// The queue is at capacity and the discipline is `Block`.
    #[error("queue is full (capacity {capacity})")]
    Full {
        /// Configured capacity.
        capacity: usize,
    },
    /// The queue has been closed.
    #[error("queue is closed")]
    Closed,
}

/// Error returned by [`BoundedQueue::try_take`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TryTakeError {
    /// No item is currently buffered.
    #[error("queue is empty")]
    Empty,
    /// The queue is closed and drained.
    #[error("queue is closed")]
    Closed,
}

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A bounded, closable FIFO queue of `T`.
///
/// Cloning the queue itself is not supported; share it behind an `Arc` to
/// give multiple producers access. The realized stage owns one `Arc` per
/// input queue and is its only reader.
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    capacity: usize,
    discipline: Discipline,
    not_empty: Notify,
    not_full: Notify,
}

impl<T> BoundedQueue<T> {
    /// Construct a queue with the given capacity and discipline.
    ///
    /// # Panics
    /// Panics if `capacity` is zero; capacity must be at least 1.
    pub fn new(capacity: usize, discipline: Discipline) -> Self {
        assert!(capacity >= 1, "queue capacity must be >= 1");
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            discipline,
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configured overflow discipline.
    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    /// Current number of buffered items.
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Whether the queue currently holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`BoundedQueue::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Close the queue. Every blocked and future [`take`](Self::take) call
    /// observes `None` once the buffer drains; every blocked and future
    /// [`put`](Self::put) call observes [`QueueError::Closed`].
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.not_empty.notify_waiters();
        self.not_full.notify_waiters();
    }

    /// Non-blocking put honoring the configured discipline.
    pub fn try_put(&self, item: T) -> Result<(), TryPutError> {
        let mut guard = self.inner.lock();
        if guard.closed {
            return Err(TryPutError::Closed);
        }
        if guard.items.len() < self.capacity {
            guard.items.push_back(item);
            drop(guard);
            self.not_empty.notify_one();
            return Ok(());
        }
        match self.discipline {
            Discipline::Block => Err(TryPutError::Full {
                capacity: self.capacity,
            }),
            Discipline::Sliding => {
                guard.items.pop_front();
                guard.items.push_back(item);
                drop(guard);
                self.not_empty.notify_one();
                Ok(())
            }
            Discipline::Dropping => Ok(()),
        }
    }

    /// Put an item, waiting for space under the `Block` discipline.
    /// `Sliding` and `Dropping` never wait — they resolve immediately by
    /// construction — so this is equivalent to `try_put` for those two.
    pub async fn put(&self, mut item: T) -> Result<(), QueueError> {
        loop {
            let notified = {
                let mut guard = self.inner.lock();
                if guard.closed {
                    return Err(QueueError::Closed);
                }
                if guard.items.len() < self.capacity || self.discipline != Discipline::Block {
                    match self.try_put_locked(&mut guard, item) {
                        Ok(()) => {
                            drop(guard);
                            self.not_empty.notify_one();
                            return Ok(());
                        }
                        Err(returned) => {
                            item = returned;
                            self.not_full.notified()
                        }
                    }
                } else {
                    self.not_full.notified()
                }
            };
            notified.await;
        }
    }

    fn try_put_locked(&self, guard: &mut Inner<T>, item: T) -> Result<(), T> {
        if guard.items.len() < self.capacity {
            guard.items.push_back(item);
            return Ok(());
        }
        match self.discipline {
            Discipline::Block => Err(item),
            Discipline::Sliding => {
                guard.items.pop_front();
                guard.items.push_back(item);
                Ok(())
            }
            Discipline::Dropping => Ok(()),
        }
    }

    /// Non-blocking take.
    pub fn try_take(&self) -> Result<T, TryTakeError> {
        let mut guard = self.inner.lock();
        if let Some(item) = guard.items.pop_front() {
            drop(guard);
            self.not_full.notify_one();
            return Ok(item);
        }
        if guard.closed {
            Err(TryTakeError::Closed)
        } else {
            Err(TryTakeError::Empty)
        }
    }

    /// Wait until [`close`](Self::close) has been called. Used to implement
    /// the pipeline-wide done signal: every holder of this queue observes
    /// the same closure without consuming a value from it.
    pub async fn closed(&self) {
        loop {
            let notified = {
                let guard = self.inner.lock();
                if guard.closed {
                    return;
                }
                self.not_empty.notified()
            };
            notified.await;
        }
    }

    /// Take the next item, waiting until one is available or the queue is
    /// closed and drained (in which case `None` is returned).
    pub async fn take(&self) -> Option<T> {
        loop {
            let notified = {
                let mut guard = self.inner.lock();
                if let Some(item) = guard.items.pop_front() {
                    drop(guard);
                    self.not_full.notify_one();
                    return Some(item);
                }
                if guard.closed {
                    return None;
                }
                self.not_empty.notified()
            };
            notified.await;
        }
    }
}
