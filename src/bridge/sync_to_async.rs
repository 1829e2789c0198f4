use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::error::PipeError;
use crate::pipe::{AsyncPipe, Listener, ListenerSet, SyncPipe};

/// A lazily-constructed sync pipe: called once, on whichever worker thread
/// claims it, to instantiate the pipe it describes.
pub type PipeSupplier<T> = Box<dyn Fn() -> Box<dyn SyncPipe<Item = T>> + Send + Sync>;

/// Wraps an ordered list of [`PipeSupplier`]s as a single async source.
/// `thread_count` workers each claim the next unclaimed supplier, drain it
/// to completion emitting `notifyNext` per item, and move to the next
/// supplier. Once every supplier has been drained (across all workers),
/// `notifyDone` fires automatically; any pipe error fires `notifyError`
/// once and cancels the remaining workers.
pub struct SyncToAsync<T: Clone + Send + Sync + 'static> {
    suppliers: Arc<Vec<PipeSupplier<T>>>,
    thread_count: usize,
    listeners: Arc<ListenerSet<T>>,
    cancelled: Arc<AtomicBool>,
    claimed: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
    reaper: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Clone + Send + Sync + 'static> SyncToAsync<T> {
    pub fn new(suppliers: Vec<PipeSupplier<T>>, thread_count: usize) -> Arc<Self> {
        Arc::new(Self {
            suppliers: Arc::new(suppliers),
            thread_count: thread_count.max(1),
            listeners: Arc::new(ListenerSet::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
            claimed: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicUsize::new(0)),
            reaper: Mutex::new(None),
        })
    }

    fn run_worker(
        suppliers: Arc<Vec<PipeSupplier<T>>>,
        listeners: Arc<ListenerSet<T>>,
        cancelled: Arc<AtomicBool>,
        claimed: Arc<AtomicUsize>,
    ) {
        loop {
            if cancelled.load(Ordering::Acquire) {
                return;
            }
            let index = claimed.fetch_add(1, Ordering::AcqRel);
            if index >= suppliers.len() {
                return;
            }

            let mut pipe = (suppliers[index])();
            if let Err(e) = pipe.start() {
                listeners.notify_error(e);
                cancelled.store(true, Ordering::Release);
                let _ = pipe.close();
                return;
            }

            loop {
                if cancelled.load(Ordering::Acquire) {
                    let _ = pipe.close();
                    return;
                }
                match pipe.next() {
                    Ok(Some(item)) => listeners.notify_item(item),
                    Ok(None) => break,
                    Err(e) => {
                        listeners.notify_error(e);
                        cancelled.store(true, Ordering::Release);
                        let _ = pipe.close();
                        return;
                    }
                }
            }
            let _ = pipe.close();
        }
    }
}

impl<T: Clone + Send + Sync + 'static> AsyncPipe<T> for SyncToAsync<T> {
    fn start(&self) -> Result<(), PipeError> {
        let mut worker_handles = Vec::with_capacity(self.thread_count);
        for _ in 0..self.thread_count {
            let suppliers = self.suppliers.clone();
            let listeners = self.listeners.clone();
            let cancelled = self.cancelled.clone();
            let claimed = self.claimed.clone();
            let completed = self.completed.clone();
            worker_handles.push(std::thread::spawn(move || {
                Self::run_worker(suppliers, listeners, cancelled, claimed);
                completed.fetch_add(1, Ordering::AcqRel);
            }));
        }

        let listeners = self.listeners.clone();
        let reaper = std::thread::spawn(move || {
            for handle in worker_handles {
                let _ = handle.join();
            }
            if !listeners.is_terminated() {
                listeners.notify_done();
            }
        });
        *self.reaper.lock() = Some(reaper);
        Ok(())
    }

    fn add_listener(&self, listener: Arc<dyn Listener<T>>) {
        self.listeners.add(listener);
    }

    fn progress(&self) -> f32 {
        if self.suppliers.is_empty() {
            1.0
        } else {
            (self.completed.load(Ordering::Acquire) as f32 / self.thread_count as f32).min(1.0)
        }
    }

    fn close(&self) -> Result<(), PipeError> {
        self.cancelled.store(true, Ordering::Release);
        if let Some(reaper) = self.reaper.lock().take() {
            let _ = reaper.join();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SeqGen;
    use std::sync::Mutex as StdMutex;

    struct Collector {
        items: StdMutex<Vec<i32>>,
        done: AtomicBool,
        errors: AtomicUsize,
    }

    impl Collector {
        fn new() -> Arc<Self> {
            Arc::new(Self { items: StdMutex::new(Vec::new()), done: AtomicBool::new(false), errors: AtomicUsize::new(0) })
        }
    }

    impl Listener<i32> for Collector {
        fn on_item(&self, item: i32) {
            self.items.lock().unwrap().push(item);
        }
        fn on_done(&self) {
            self.done.store(true, Ordering::SeqCst);
        }
        fn on_error(&self, _error: PipeError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn supplier_of(values: Vec<i32>) -> PipeSupplier<i32> {
        Box::new(move || Box::new(crate::source::Collection::new(values.clone())))
    }

    /// Polls until the listener observes a terminal notification, up to a
    /// generous bound, so tests observe natural completion rather than
    /// racing `close()`'s forced cancellation against in-flight workers.
    fn wait_for_terminal(collector: &Collector) {
        for _ in 0..500 {
            if collector.done.load(Ordering::SeqCst) || collector.errors.load(Ordering::SeqCst) > 0 {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("listener never observed a terminal notification");
    }

    #[test]
    fn drains_every_supplier_and_fires_done() {
        let suppliers = vec![supplier_of(vec![1, 2]), supplier_of(vec![3, 4]), supplier_of(vec![5])];
        let bridge = SyncToAsync::new(suppliers, 2);
        let collector = Collector::new();
        bridge.add_listener(collector.clone());
        bridge.start().unwrap();
        wait_for_terminal(&collector);
        bridge.close().unwrap();

        let mut items = collector.items.lock().unwrap().clone();
        items.sort();
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert!(collector.done.load(Ordering::SeqCst));
    }

    #[test]
    fn error_from_one_supplier_stops_the_others() {
        let suppliers: Vec<PipeSupplier<i32>> = vec![
            Box::new(|| Box::new(crate::source::ErrorSource::new(PipeError::io("boom")))),
            supplier_of((0..10_000).collect()),
        ];
        let bridge = SyncToAsync::new(suppliers, 2);
        let collector = Collector::new();
        bridge.add_listener(collector.clone());
        bridge.start().unwrap();
        wait_for_terminal(&collector);
        bridge.close().unwrap();

        assert_eq!(collector.errors.load(Ordering::SeqCst), 1);
        assert!(!collector.done.load(Ordering::SeqCst));
    }

    #[test]
    fn seq_gen_as_supplier_preserves_per_supplier_order() {
        let suppliers = vec![Box::new(|| -> Box<dyn SyncPipe<Item = i32>> { Box::new(SeqGen::new(5, |i| i as i32)) }) as PipeSupplier<i32>];
        let bridge = SyncToAsync::new(suppliers, 1);
        let collector = Collector::new();
        bridge.add_listener(collector.clone());
        bridge.start().unwrap();
        wait_for_terminal(&collector);
        bridge.close().unwrap();
        assert_eq!(*collector.items.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }
}
