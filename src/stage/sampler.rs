use crate::error::PipeError;
use crate::pipe::SyncPipe;
use crate::rng::SeededRng;

/// Emits each upstream item independently with probability `p`.
pub struct PortionSampler<P: SyncPipe> {
    upstream: P,
    p: f64,
    rng: SeededRng,
    buffered: Option<P::Item>,
    ended: bool,
}

impl<P: SyncPipe> PortionSampler<P> {
    pub fn new(upstream: P, p: f64, rng: SeededRng) -> Self {
        Self { upstream, p, rng, buffered: None, ended: false }
    }

    fn pull(&mut self) -> Result<Option<P::Item>, PipeError> {
        loop {
            match self.upstream.next()? {
                None => return Ok(None),
                Some(item) => {
                    if self.rng.next_bool_with_probability(self.p) {
                        return Ok(Some(item));
                    }
                }
            }
        }
    }
}

impl<P: SyncPipe> SyncPipe for PortionSampler<P>
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

/// Online sampler that selects exactly `m` of the declared `n` upstream
/// items (exact iff the actual upstream length equals `n`), via the
/// classic "remaining-to-sample / remaining" Bernoulli trial: at each item
/// the selection probability is `remaining_to_sample / remaining`, and
/// `remaining` is decremented whether or not the item was selected.
pub struct ExactSampler<P: SyncPipe> {
    upstream: P,
    rng: SeededRng,
    remaining: u64,
    remaining_to_sample: u64,
    buffered: Option<P::Item>,
    ended: bool,
}

impl<P: SyncPipe> ExactSampler<P> {
    pub fn new(upstream: P, n: u64, m: u64, rng: SeededRng) -> Self {
        Self { upstream, rng, remaining: n, remaining_to_sample: m.min(n), buffered: None, ended: false }
    }

    fn pull(&mut self) -> Result<Option<P::Item>, PipeError> {
        loop {
            if self.remaining_to_sample == 0 {
                return Ok(None);
            }
            match self.upstream.next()? {
                None => return Ok(None),
                Some(item) => {
                    let p = self.remaining_to_sample as f64 / self.remaining.max(1) as f64;
                    let selected = self.rng.next_bool_with_probability(p);
                    self.remaining = self.remaining.saturating_sub(1);
                    if selected {
                        self.remaining_to_sample -= 1;
                        return Ok(Some(item));
                    }
                }
            }
        }
    }
}

impl<P: SyncPipe> SyncPipe for ExactSampler<P>
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SeqGen;

    #[test]
    fn exact_sampler_selects_exactly_m_when_length_matches_n() {
        let upstream = SeqGen::new(100, |i| i as i64);
        let mut sampler = ExactSampler::new(upstream, 100, 10, SeededRng::new(7));
        sampler.start().unwrap();
        let mut count = 0;
        while sampler.next().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 10);
    }

    #[test]
    fn exact_sampler_is_reproducible_given_same_seed() {
        let make = || {
            let upstream = SeqGen::new(50, |i| i as i64);
            let mut sampler = ExactSampler::new(upstream, 50, 5, SeededRng::new(123));
            sampler.start().unwrap();
            let mut out = Vec::new();
            while let Some(v) = sampler.next().unwrap() {
                out.push(v);
            }
            out
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn portion_sampler_never_exceeds_upstream_length() {
        let upstream = SeqGen::new(20, |i| i as i64);
        let mut sampler = PortionSampler::new(upstream, 0.5, SeededRng::new(1));
        sampler.start().unwrap();
        let mut count = 0;
        while sampler.next().unwrap().is_some() {
            count += 1;
        }
        assert!(count <= 20);
    }
}
