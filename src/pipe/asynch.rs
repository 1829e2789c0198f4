//! Async pipe contract (spec.md §4.C) — push-model stage, producer-driven.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::PipeError;

/// A listener registered on an async stage. Must be safe to call from any
/// producer thread. Contract: at most one of `on_done`/`on_error` is ever
/// delivered, and never followed by `on_item` (spec.md §4.C).
pub trait Listener<T>: Send + Sync {
    fn on_item(&self, item: T);
    fn on_done(&self);
    fn on_error(&self, error: PipeError);
}

/// A push-model stage. `start()` returns immediately; item production
/// happens on worker threads/tasks that notify registered listeners.
pub trait AsyncPipe<T>: Send + Sync {
    fn start(&self) -> Result<(), PipeError>;
    fn add_listener(&self, listener: Arc<dyn Listener<T>>);
    fn progress(&self) -> f32;

    /// Sets the cancellation flag and blocks until every production thread
    /// this stage owns has joined. Idempotent.
    fn close(&self) -> Result<(), PipeError>;
}

/// Fan-out helper shared by every async stage: a listener set guarded by a
/// single mutex, plus the "first terminal notification wins" latch
/// (spec.md §4.C / §7: "the first notifyError wins; subsequent errors are
/// dropped"). Delivery takes an immutable snapshot of the listener `Vec`
/// before invoking callbacks, so a listener that re-enters the stage from
/// inside `on_item` cannot deadlock on the registration mutex (Design Note
/// §9: "deliver notifications while holding an immutable snapshot").
pub struct ListenerSet<T> {
    listeners: Mutex<Vec<Arc<dyn Listener<T>>>>,
    terminated: AtomicBool,
}

impl<T: Clone> ListenerSet<T> {
    pub fn new() -> Self {
        Self { listeners: Mutex::new(Vec::new()), terminated: AtomicBool::new(false) }
    }

    pub fn add(&self, listener: Arc<dyn Listener<T>>) {
        self.listeners.lock().push(listener);
    }

    fn snapshot(&self) -> Vec<Arc<dyn Listener<T>>> {
        self.listeners.lock().clone()
    }

    /// Delivers an item to every listener. A no-op after termination.
    pub fn notify_item(&self, item: T) {
        if self.terminated.load(Ordering::Acquire) {
            return;
        }
        for listener in self.snapshot() {
            listener.on_item(item.clone());
        }
    }

    /// Delivers `on_done` exactly once across the lifetime of this set.
    pub fn notify_done(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        for listener in self.snapshot() {
            listener.on_done();
        }
    }

    /// Delivers `on_error` exactly once across the lifetime of this set;
    /// any later `notify_done`/`notify_error` call is dropped.
    pub fn notify_error(&self, error: PipeError) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        for listener in self.snapshot() {
            listener.on_error(error.clone());
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}

impl<T: Clone> Default for ListenerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct Recorder {
        items: Mutex<Vec<i32>>,
        dones: AtomicU32,
        errors: AtomicU32,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self { items: Mutex::new(Vec::new()), dones: AtomicU32::new(0), errors: AtomicU32::new(0) })
        }
    }

    impl Listener<i32> for Recorder {
        fn on_item(&self, item: i32) {
            self.items.lock().push(item);
        }
        fn on_done(&self) {
            self.dones.fetch_add(1, Ordering::SeqCst);
        }
        fn on_error(&self, _error: PipeError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn done_then_item_is_dropped() {
        let set: ListenerSet<i32> = ListenerSet::new();
        let rec = Recorder::new();
        set.add(rec.clone());

        set.notify_item(1);
        set.notify_done();
        set.notify_item(2);

        assert_eq!(*rec.items.lock(), vec![1]);
        assert_eq!(rec.dones.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn only_first_terminal_wins() {
        let set: ListenerSet<i32> = ListenerSet::new();
        let rec = Recorder::new();
        set.add(rec.clone());

        set.notify_error(PipeError::io("boom"));
        set.notify_done();
        set.notify_error(PipeError::io("boom again"));

        assert_eq!(rec.errors.load(Ordering::SeqCst), 1);
        assert_eq!(rec.dones.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn late_listener_misses_earlier_items_but_set_still_works() {
        let set: ListenerSet<i32> = ListenerSet::new();
        set.notify_item(1);
        let rec = Recorder::new();
        set.add(rec.clone());
        set.notify_item(2);
        assert_eq!(*rec.items.lock(), vec![2]);
    }
}
