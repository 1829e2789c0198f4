use crate::error::PipeError;
use crate::pipe::SyncPipe;

/// Side-effecting pass-through: `on_item` fires exactly once per item, at
/// the point it is first pulled off upstream (not on every `peek`/`next`
/// call that merely reads the lookahead buffer).
pub struct Callback<P: SyncPipe, F: FnMut(&P::Item)> {
    upstream: P,
    on_item: F,
    buffered: Option<P::Item>,
    ended: bool,
}

impl<P: SyncPipe, F: FnMut(&P::Item)> Callback<P, F> {
    pub fn new(upstream: P, on_item: F) -> Self {
        Self { upstream, on_item, buffered: None, ended: false }
    }

    fn pull(&mut self) -> Result<Option<P::Item>, PipeError> {
        match self.upstream.next()? {
            Some(item) => {
                (self.on_item)(&item);
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }
}

impl<P: SyncPipe, F: FnMut(&P::Item) + Send> SyncPipe for Callback<P, F>
where
    P::Item: Send,
{
    type Item = P::Item;

    fn start(&mut self) -> Result<(), PipeError> {
        self.upstream.start()
    }

    fn next(&mut self) -> Result<Option<P::Item>, PipeError> {
        if let Some(item) = self.buffered.take() {
            return Ok(Some(item));
        }
        if self.ended {
            return Ok(None);
        }
        match self.pull()? {
            Some(item) => Ok(Some(item)),
            None => {
                self.ended = true;
                Ok(None)
            }
        }
    }

    fn peek(&mut self) -> Result<Option<&P::Item>, PipeError> {
        if self.buffered.is_none() && !self.ended {
            match self.pull()? {
                Some(item) => self.buffered = Some(item),
                None => self.ended = true,
            }
        }
        Ok(self.buffered.as_ref())
    }

    fn progress(&self) -> f32 {
        self.upstream.progress()
    }

    fn close(&mut self) -> Result<(), PipeError> {
        self.upstream.close()
    }
}
