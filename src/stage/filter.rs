use crate::error::PipeError;
use crate::pipe::SyncPipe;

/// Pulls upstream until `should_select(item)` passes. Progress is delegated
/// to upstream since a filter cannot know how many items it will discard.
pub struct FilterBase<P: SyncPipe, F: FnMut(&P::Item) -> bool> {
    upstream: P,
    should_select: F,
    buffered: Option<P::Item>,
    ended: bool,
}

impl<P: SyncPipe, F: FnMut(&P::Item) -> bool> FilterBase<P, F> {
    pub fn new(upstream: P, should_select: F) -> Self {
        Self { upstream, should_select, buffered: None, ended: false }
    }

    fn pull_matching(&mut self) -> Result<Option<P::Item>, PipeError> {
        loop {
            match self.upstream.next()? {
                None => return Ok(None),
                Some(item) => {
                    if (self.should_select)(&item) {
                        return Ok(Some(item));
                    }
                }
            }
        }
    }
}

impl<P: SyncPipe, F: FnMut(&P::Item) -> bool + Send> SyncPipe for FilterBase<P, F>
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
        match self.pull_matching()? {
            Some(item) => Ok(Some(item)),
            None => {
                self.ended = true;
                Ok(None)
            }
        }
    }

    fn peek(&mut self) -> Result<Option<&P::Item>, PipeError> {
        if self.buffered.is_none() && !self.ended {
            match self.pull_matching()? {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SeqGen;

    #[test]
    fn keeps_only_selected_items() {
        let upstream = SeqGen::new(6, |i| i as i64);
        let mut filtered = FilterBase::new(upstream, |v: &i64| v % 2 == 0);
        filtered.start().unwrap();
        let mut out = Vec::new();
        while let Some(v) = filtered.next().unwrap() {
            out.push(v);
        }
        assert_eq!(out, vec![0, 2, 4]);
    }

    #[test]
    fn peek_finds_next_match_without_consuming() {
        let upstream = SeqGen::new(4, |i| i as i64);
        let mut filtered = FilterBase::new(upstream, |v: &i64| *v >= 2);
        filtered.start().unwrap();
        assert_eq!(filtered.peek().unwrap().copied(), Some(2));
        assert_eq!(filtered.peek().unwrap().copied(), Some(2));
        assert_eq!(filtered.next().unwrap(), Some(2));
    }
}
