//! Bounded blocking queue used by the sync/async bridges (§4.F).
//!
//! `AsyncToSync` needs a queue that a plain OS thread can block on without a
//! tokio runtime — `flume`/`tokio::sync::mpsc` both assume an async or
//! channel-select consumer. This is a small `Mutex` + `Condvar` MPSC with a
//! bounded capacity (providing the backpressure the spec requires: a full
//! queue blocks the producer) and an explicit `close()` that wakes every
//! waiter instead of leaving them parked forever.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::PipeError;

/// Tagged union transported through the queue: data, end-of-stream, or an
/// error — see the `QueueItem<T>` data model in spec.md §3.
#[derive(Debug, Clone)]
pub enum QueueItem<T> {
    Item(T),
    EndOfData,
    Error(PipeError),
}

struct Inner<T> {
    items: VecDeque<QueueItem<T>>,
    capacity: usize,
    closed: bool,
}

/// A bounded, multi-producer/single-consumer blocking queue.
pub struct BlockingQueue<T> {
    state: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BlockingQueue<T> {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(Inner { items: VecDeque::new(), capacity, closed: false }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    /// Blocking put. Blocks while the queue is at capacity and open. Returns
    /// `Err` if the queue was closed before or while waiting — the caller
    /// (a producer thread) should stop promptly, per the bridge's
    /// cancellation contract.
    pub fn put(&self, item: QueueItem<T>) -> Result<(), PipeError> {
        let mut guard = self.state.lock();
        loop {
            if guard.closed {
                return Err(PipeError::queue("queue closed"));
            }
            if guard.items.len() < guard.capacity {
                guard.items.push_back(item);
                self.not_empty.notify_one();
                return Ok(());
            }
            self.not_full.wait(&mut guard);
        }
    }

    /// Blocking take. Returns `None` once the queue is closed and drained.
    pub fn take(&self) -> Option<QueueItem<T>> {
        let mut guard = self.state.lock();
        loop {
            if let Some(item) = guard.items.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            if guard.closed {
                return None;
            }
            self.not_empty.wait(&mut guard);
        }
    }

    /// Marks the queue closed and wakes every blocked producer/consumer.
    /// Already-enqueued items are dropped (spec §9 Open Question: an
    /// in-flight item blocked on a full queue is dropped on close, not
    /// delivered).
    pub fn close(&self) {
        let mut guard = self.state.lock();
        guard.closed = true;
        guard.items.clear();
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Non-blocking take: returns `None` immediately if nothing is queued,
    /// without distinguishing "empty but open" from "empty and closed" —
    /// callers that need that distinction should also check `is_closed`.
    pub fn try_take(&self) -> Option<QueueItem<T>> {
        let mut guard = self.state.lock();
        let item = guard.items.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
