//! Sync pipe contract (spec.md §4.B) — pull-model stage, single-threaded
//! consumer.

use crate::error::PipeError;

/// A pull-model stage. `next`/`peek` return `Ok(None)` for end-of-stream —
/// item type `T` must never itself be the sentinel, which is enforced by
/// the type system here (no `Option<T>` is ever a valid item).
///
/// Implementors must uphold: once `next()` yields `Ok(None)`, every
/// subsequent `next()`/`peek()` also yields `Ok(None)` (spec.md §3, §8).
pub trait SyncPipe: Send {
    type Item;

    /// Must be called before the first `next`/`peek`. Not idempotent —
    /// calling twice is a logic error in the caller, not a pipe error.
    fn start(&mut self) -> Result<(), PipeError>;

    /// Pull the next item, advancing the one-item lookahead buffer used by
    /// `peek`. Returns `Ok(None)` at end-of-stream.
    fn next(&mut self) -> Result<Option<Self::Item>, PipeError>;

    /// Look at, without consuming, the next item. Never propagates
    /// `Interrupted` — on interruption it marks the current thread
    /// interrupted (see [`crate::interrupt`]) and returns `Ok(None)`.
    fn peek(&mut self) -> Result<Option<&Self::Item>, PipeError>;

    /// Monotone non-decreasing fraction in `[0.0, 1.0]` once started.
    fn progress(&self) -> f32;

    /// Idempotent. Must release all resources including the upstream
    /// stage, if any.
    fn close(&mut self) -> Result<(), PipeError>;
}

impl<T> SyncPipe for Box<dyn SyncPipe<Item = T>> {
    type Item = T;

    fn start(&mut self) -> Result<(), PipeError> {
        (**self).start()
    }

    fn next(&mut self) -> Result<Option<T>, PipeError> {
        (**self).next()
    }

    fn peek(&mut self) -> Result<Option<&T>, PipeError> {
        (**self).peek()
    }

    fn progress(&self) -> f32 {
        (**self).progress()
    }

    fn close(&mut self) -> Result<(), PipeError> {
        (**self).close()
    }
}

/// Shared one-item lookahead buffer, reused by every stage that implements
/// `peek` on top of a plain `next`-only source (spec.md §3: "a one-item
/// lookahead buffer for peek").
#[derive(Default)]
pub struct PeekBuffer<T> {
    buffered: Option<T>,
    ended: bool,
}

impl<T> PeekBuffer<T> {
    pub fn new() -> Self {
        Self { buffered: None, ended: false }
    }

    /// Fetches the peeked item (or pulls a fresh one via `pull`), removing
    /// it from the buffer so the next call advances.
    pub fn next_with<E>(
        &mut self,
        mut pull: impl FnMut() -> Result<Option<T>, E>,
    ) -> Result<Option<T>, E> {
        if let Some(item) = self.buffered.take() {
            return Ok(Some(item));
        }
        if self.ended {
            return Ok(None);
        }
        match pull()? {
            Some(item) => Ok(Some(item)),
            None => {
                self.ended = true;
                Ok(None)
            }
        }
    }

    /// Fetches (and caches) the item behind `peek`, pulling via `pull` only
    /// if the buffer is currently empty.
    pub fn peek_with<E>(
        &mut self,
        mut pull: impl FnMut() -> Result<Option<T>, E>,
    ) -> Result<Option<&T>, E> {
        if self.buffered.is_none() && !self.ended {
            match pull()? {
                Some(item) => self.buffered = Some(item),
                None => self.ended = true,
            }
        }
        Ok(self.buffered.as_ref())
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }
}
