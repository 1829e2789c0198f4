use std::sync::Arc;
use std::time::Duration;

use crate::error::PipeError;
use crate::pipe::SyncPipe;
use crate::queue::{BlockingQueue, QueueItem};

/// Sync pipe that blocks on a [`BlockingQueue`] until an `EndOfData` or
/// `Error` frame arrives. `peek` busy-waits with a 10ms sleep (spec.md
/// §4.D) so it can preserve the one-item lookahead without a second,
/// competing blocking `take`.
pub struct QueueReader<T> {
    queue: Arc<BlockingQueue<T>>,
    buffered: Option<T>,
    ended: bool,
}

impl<T> QueueReader<T> {
    pub fn new(queue: Arc<BlockingQueue<T>>) -> Self {
        Self { queue, buffered: None, ended: false }
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

impl<T: Send> SyncPipe for QueueReader<T> {
    type Item = T;

    fn start(&mut self) -> Result<(), PipeError> {
        Ok(())
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
        loop {
            if self.buffered.is_some() || self.ended {
                break;
            }
            if crate::interrupt::is_current_thread_interrupted() {
                self.ended = true;
                return Ok(None);
            }
            match self.queue.try_take() {
                Some(QueueItem::Item(item)) => {
                    self.buffered = Some(item);
                    break;
                }
                Some(QueueItem::EndOfData) => {
                    self.ended = true;
                    break;
                }
                Some(QueueItem::Error(e)) => {
                    self.ended = true;
                    return Err(e);
                }
                None => {
                    if self.queue.is_closed() {
                        self.ended = true;
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }
        Ok(self.buffered.as_ref())
    }

    fn progress(&self) -> f32 {
        if self.ended {
            1.0
        } else {
            0.0
        }
    }

    fn close(&mut self) -> Result<(), PipeError> {
        self.queue.close();
        Ok(())
    }
}
