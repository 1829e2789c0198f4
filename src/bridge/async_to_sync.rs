use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::PipeError;
use crate::pipe::{AsyncPipe, Listener};
use crate::queue::{BlockingQueue, QueueItem};

struct QueueListener<T> {
    queue: Arc<BlockingQueue<T>>,
}

impl<T: Send + Sync + 'static> Listener<T> for QueueListener<T> {
    fn on_item(&self, item: T) {
        let _ = self.queue.put(QueueItem::Item(item));
    }
    fn on_done(&self) {
        let _ = self.queue.put(QueueItem::EndOfData);
    }
    fn on_error(&self, error: PipeError) {
        let _ = self.queue.put(QueueItem::Error(error));
    }
}

/// Adapts an `AsyncPipe` into a `SyncPipe` by registering a listener that
/// enqueues every notification into a bounded [`BlockingQueue`]. The bound
/// is the backpressure mechanism: a full queue blocks `on_item` (and thus
/// whichever producer thread upstream is calling it) until the sync
/// consumer drains it.
pub struct AsyncToSync<T: Send + Sync + 'static> {
    upstream: Arc<dyn AsyncPipe<T>>,
    queue: Arc<BlockingQueue<T>>,
    cancelled: Arc<AtomicBool>,
    buffered: Option<T>,
    ended: bool,
}

impl<T: Send + Sync + 'static> AsyncToSync<T> {
    pub fn new(upstream: Arc<dyn AsyncPipe<T>>, capacity: usize) -> Self {
        let queue = BlockingQueue::new(capacity);
        upstream.add_listener(Arc::new(QueueListener { queue: queue.clone() }));
        Self { upstream, queue, cancelled: Arc::new(AtomicBool::new(false)), buffered: None, ended: false }
    }

    fn take_one(&mut self) -> Result<Option<T>, PipeError> {
        match self.queue.take() {
            Some(QueueItem::Item(item)) => Ok(Some(item)),
            Some(QueueItem::EndOfData) | None => {
                self.ended = true;
                Ok(None)
            }
            Some(QueueItem::Error(e)) => {
                self.ended = true;
                Err(e)
            }
        }
    }
}

impl<T: Send + Sync + 'static> crate::pipe::SyncPipe for AsyncToSync<T> {
    type Item = T;

    fn start(&mut self) -> Result<(), PipeError> {
        self.upstream.start()
    }

    fn next(&mut self) -> Result<Option<T>, PipeError> {
        if let Some(item) = self.buffered.take() {
            return Ok(Some(item));
        }
        if self.ended {
            return Ok(None);
        }
        self.take_one()
    }

    fn peek(&mut self) -> Result<Option<&T>, PipeError> {
        if self.buffered.is_none() && !self.ended {
            match self.take_one()? {
                Some(item) => self.buffered = Some(item),
                None => self.ended = true,
            }
        }
        Ok(self.buffered.as_ref())
    }

    fn progress(&self) -> f32 {
        self.upstream.progress()
    }

    /// Drains promptly: sets the cancel flag, drops any pending frames, and
    /// closes upstream. Does not wait for more items to arrive.
    fn close(&mut self) -> Result<(), PipeError> {
        self.cancelled.store(true, Ordering::Release);
        self.queue.close();
        self.upstream.close()
    }
}
