use crate::error::PipeError;
use crate::pipe::SyncPipe;

/// Yields `f(0), f(1), ..., f(count - 1)` in order.
pub struct SeqGen<T, F: FnMut(usize) -> T> {
    f: F,
    count: usize,
    index: usize,
    buffered: Option<T>,
    ended: bool,
}

impl<T, F: FnMut(usize) -> T> SeqGen<T, F> {
    pub fn new(count: usize, f: F) -> Self {
        Self { f, count, index: 0, buffered: None, ended: false }
    }

    fn pull(&mut self) -> Option<T> {
        if self.index >= self.count {
            return None;
        }
        let item = (self.f)(self.index);
        self.index += 1;
        Some(item)
    }
}

impl<T: Send, F: FnMut(usize) -> T + Send> SyncPipe for SeqGen<T, F> {
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
        match self.pull() {
            Some(item) => Ok(Some(item)),
            None => {
                self.ended = true;
                Ok(None)
            }
        }
    }

    fn peek(&mut self) -> Result<Option<&T>, PipeError> {
        if self.buffered.is_none() && !self.ended {
            match self.pull() {
                Some(item) => self.buffered = Some(item),
                None => self.ended = true,
            }
        }
        Ok(self.buffered.as_ref())
    }

    fn progress(&self) -> f32 {
        if self.count == 0 {
            1.0
        } else {
            (self.index as f32 / self.count as f32).min(1.0)
        }
    }

    fn close(&mut self) -> Result<(), PipeError> {
        Ok(())
    }
}
