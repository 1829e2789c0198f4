use std::cmp::Ordering;

use crate::error::PipeError;
use crate::pipe::SyncPipe;

/// Validates that upstream items never regress according to `cmp`. Fails
/// with `OutOfOrder` as soon as a later item compares less than the one
/// before it.
pub struct OrderValidation<P: SyncPipe, C: FnMut(&P::Item, &P::Item) -> Ordering>
where
    P::Item: Clone,
{
    upstream: P,
    cmp: C,
    last: Option<P::Item>,
    buffered: Option<P::Item>,
    ended: bool,
}

impl<P: SyncPipe, C: FnMut(&P::Item, &P::Item) -> Ordering> OrderValidation<P, C>
where
    P::Item: Clone,
{
    pub fn new(upstream: P, cmp: C) -> Self {
        Self { upstream, cmp, last: None, buffered: None, ended: false }
    }

    fn pull(&mut self) -> Result<Option<P::Item>, PipeError> {
        match self.upstream.next()? {
            None => Ok(None),
            Some(item) => {
                if let Some(last) = &self.last {
                    if (self.cmp)(last, &item) == Ordering::Greater {
                        return Err(PipeError::out_of_order(
                            "upstream item compares less than its predecessor",
                        ));
                    }
                }
                self.last = Some(item.clone());
                Ok(Some(item))
            }
        }
    }
}

impl<P: SyncPipe, C: FnMut(&P::Item, &P::Item) -> Ordering + Send> SyncPipe for OrderValidation<P, C>
where
    P::Item: Clone + Send,
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
