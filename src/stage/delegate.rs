use crate::error::PipeError;
use crate::pipe::SyncPipe;

/// Forwards every operation to an inner pipe unchanged. Base building block
/// for wrapper stages that only need to override one or two methods —
/// compose by wrapping `DelegatePipe` and shadowing the method that
/// differs, rather than re-implementing the whole trait.
pub struct DelegatePipe<P: SyncPipe> {
    inner: P,
}

impl<P: SyncPipe> DelegatePipe<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.inner
    }
}

impl<P: SyncPipe> SyncPipe for DelegatePipe<P> {
    type Item = P::Item;

    fn start(&mut self) -> Result<(), PipeError> {
        self.inner.start()
    }

    fn next(&mut self) -> Result<Option<P::Item>, PipeError> {
        self.inner.next()
    }

    fn peek(&mut self) -> Result<Option<&P::Item>, PipeError> {
        self.inner.peek()
    }

    fn progress(&self) -> f32 {
        self.inner.progress()
    }

    fn close(&mut self) -> Result<(), PipeError> {
        self.inner.close()
    }
}
