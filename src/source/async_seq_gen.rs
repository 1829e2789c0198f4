use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::error::PipeError;
use crate::pipe::{AsyncPipe, Listener, ListenerSet};

/// Partitions `0..count` round-robin across `threads` worker threads; each
/// worker emits `f(i)` via `notifyNext`. Order across producers is not
/// preserved (spec.md §5: "no ordering guarantee between parallel
/// producers"). A reaper thread joins every worker and fires `notifyDone`
/// automatically, unless `close` terminates the listener set first.
pub struct AsyncSeqGen<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(usize) -> T + Send + Sync + 'static,
{
    count: usize,
    threads: usize,
    f: Arc<F>,
    listeners: Arc<ListenerSet<T>>,
    cancelled: Arc<AtomicBool>,
    emitted: Arc<AtomicUsize>,
    reaper: Mutex<Option<JoinHandle<()>>>,
}

impl<T, F> AsyncSeqGen<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(usize) -> T + Send + Sync + 'static,
{
    pub fn new(count: usize, f: F, threads: usize) -> Arc<Self> {
        Arc::new(Self {
            count,
            threads: threads.max(1),
            f: Arc::new(f),
            listeners: Arc::new(ListenerSet::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
            emitted: Arc::new(AtomicUsize::new(0)),
            reaper: Mutex::new(None),
        })
    }
}

impl<T, F> AsyncPipe<T> for AsyncSeqGen<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(usize) -> T + Send + Sync + 'static,
{
    fn start(&self) -> Result<(), PipeError> {
        let next_index = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(self.threads);

        for _ in 0..self.threads {
            let next_index = next_index.clone();
            let count = self.count;
            let f = self.f.clone();
            let listeners = self.listeners.clone();
            let cancelled = self.cancelled.clone();
            let emitted = self.emitted.clone();

            handles.push(std::thread::spawn(move || {
                loop {
                    if cancelled.load(Ordering::Acquire) {
                        return;
                    }
                    let i = next_index.fetch_add(1, Ordering::AcqRel);
                    if i >= count {
                        return;
                    }
                    let item = f(i);
                    listeners.notify_item(item);
                    emitted.fetch_add(1, Ordering::AcqRel);
                }
            }));
        }

        let listeners = self.listeners.clone();
        let reaper = std::thread::spawn(move || {
            for handle in handles {
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
        if self.count == 0 {
            1.0
        } else {
            (self.emitted.load(Ordering::Acquire) as f32 / self.count as f32).min(1.0)
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
