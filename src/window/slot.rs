//! Concrete slot record variants (spec.md §4.I): count, sum, average,
//! min/max, percentile. Count/sum/average/min-max fields are lock-free
//! per-field atomics (spec.md §5); the percentile sketch cannot be made
//! field-atomic, so it is the one field behind a `parking_lot::RwLock`.

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::SlotRecord;

/// Counts events; ignores their value.
#[derive(Default)]
pub struct CountSlot {
    count: AtomicU64,
}

impl SlotRecord for CountSlot {
    type Event = ();
    type Snapshot = u64;

    fn new() -> Self {
        Self::default()
    }

    fn reset(&self) {
        self.count.store(0, Ordering::Release);
    }

    fn update(&self, _event: &()) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    fn snapshot(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    fn combine(snapshots: Vec<u64>) -> u64 {
        snapshots.iter().sum()
    }
}

/// Sums `f64` event values, stored as bit patterns behind a CAS loop
/// since `AtomicF64` does not exist in std.
#[derive(Default)]
pub struct SumSlot {
    bits: AtomicU64,
}

fn atomic_f64_add(bits: &AtomicU64, value: f64) {
    let mut current = bits.load(Ordering::Acquire);
    loop {
        let next = f64::from_bits(current) + value;
        match bits.compare_exchange_weak(
            current,
            next.to_bits(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => return,
            Err(observed) => current = observed,
        }
    }
}

impl SlotRecord for SumSlot {
    type Event = f64;
    type Snapshot = f64;

    fn new() -> Self {
        Self::default()
    }

    fn reset(&self) {
        self.bits.store(0f64.to_bits(), Ordering::Release);
    }

    fn update(&self, event: &f64) {
        atomic_f64_add(&self.bits, *event);
    }

    fn snapshot(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    fn combine(snapshots: Vec<f64>) -> f64 {
        snapshots.iter().sum()
    }
}

/// Tracks both sum and count so a caller can divide for the mean.
#[derive(Default)]
pub struct AverageSlot {
    sum_bits: AtomicU64,
    count: AtomicU64,
}

impl SlotRecord for AverageSlot {
    type Event = f64;
    type Snapshot = (f64, u64);

    fn new() -> Self {
        Self::default()
    }

    fn reset(&self) {
        self.sum_bits.store(0f64.to_bits(), Ordering::Release);
        self.count.store(0, Ordering::Release);
    }

    fn update(&self, event: &f64) {
        atomic_f64_add(&self.sum_bits, *event);
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    fn snapshot(&self) -> (f64, u64) {
        (f64::from_bits(self.sum_bits.load(Ordering::Acquire)), self.count.load(Ordering::Acquire))
    }

    fn combine(snapshots: Vec<(f64, u64)>) -> (f64, u64) {
        snapshots.iter().fold((0.0, 0u64), |(sum, count), (s, c)| (sum + s, count + c))
    }
}

/// Tracks the running min/max via `AtomicI64::fetch_min`/`fetch_max` on a
/// fixed-point representation (values scaled by 1000 to retain three
/// decimal digits without floating-point CAS retries).
const MINMAX_SCALE: f64 = 1000.0;

pub struct MinMaxSlot {
    min: AtomicI64,
    max: AtomicI64,
}

impl Default for MinMaxSlot {
    fn default() -> Self {
        Self { min: AtomicI64::new(i64::MAX), max: AtomicI64::new(i64::MIN) }
    }
}

impl SlotRecord for MinMaxSlot {
    type Event = f64;
    type Snapshot = (f64, f64);

    fn new() -> Self {
        Self::default()
    }

    fn reset(&self) {
        self.min.store(i64::MAX, Ordering::Release);
        self.max.store(i64::MIN, Ordering::Release);
    }

    fn update(&self, event: &f64) {
        let scaled = (*event * MINMAX_SCALE) as i64;
        self.min.fetch_min(scaled, Ordering::AcqRel);
        self.max.fetch_max(scaled, Ordering::AcqRel);
    }

    fn snapshot(&self) -> (f64, f64) {
        (
            self.min.load(Ordering::Acquire) as f64 / MINMAX_SCALE,
            self.max.load(Ordering::Acquire) as f64 / MINMAX_SCALE,
        )
    }

    fn combine(snapshots: Vec<(f64, f64)>) -> (f64, f64) {
        snapshots.iter().fold((f64::MAX, f64::MIN), |(min, max), &(s_min, s_max)| {
            (min.min(s_min), max.max(s_max))
        })
    }
}

const RESERVOIR_CAPACITY: usize = 256;

/// A bounded reservoir sketch: the first `RESERVOIR_CAPACITY` values are
/// kept outright, after which each new value replaces a uniformly random
/// existing slot with probability `RESERVOIR_CAPACITY / seen`.
pub struct PercentileSlot {
    seen: AtomicUsize,
    rng_state: AtomicU64,
    reservoir: RwLock<Vec<f64>>,
}

impl Default for PercentileSlot {
    fn default() -> Self {
        Self {
            seen: AtomicUsize::new(0),
            rng_state: AtomicU64::new(0x2545F4914F6CDD1D),
            reservoir: RwLock::new(Vec::with_capacity(RESERVOIR_CAPACITY)),
        }
    }
}

impl PercentileSlot {
    /// xorshift64*, cheap enough to call under contention without a lock.
    fn next_random(&self) -> u64 {
        let mut x = self.rng_state.load(Ordering::Relaxed);
        loop {
            let mut next = x;
            next ^= next << 13;
            next ^= next >> 7;
            next ^= next << 17;
            match self.rng_state.compare_exchange_weak(
                x,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next.wrapping_mul(0x2545F4914F6CDD1D),
                Err(observed) => x = observed,
            }
        }
    }
}

impl SlotRecord for PercentileSlot {
    type Event = f64;
    /// The merged sample set handed to `percentile`.
    type Snapshot = Vec<f64>;

    fn new() -> Self {
        Self::default()
    }

    fn reset(&self) {
        self.seen.store(0, Ordering::Release);
        self.reservoir.write().clear();
    }

    fn update(&self, event: &f64) {
        let n = self.seen.fetch_add(1, Ordering::AcqRel);
        if n < RESERVOIR_CAPACITY {
            self.reservoir.write().push(*event);
        } else {
            let j = (self.next_random() % (n as u64 + 1)) as usize;
            if j < RESERVOIR_CAPACITY {
                self.reservoir.write()[j] = *event;
            }
        }
    }

    fn snapshot(&self) -> Vec<f64> {
        self.reservoir.read().clone()
    }

    fn combine(snapshots: Vec<Vec<f64>>) -> Vec<f64> {
        snapshots.into_iter().flatten().collect()
    }
}

/// Computes the `p`-th percentile (0.0..=100.0) of a merged sample set,
/// nearest-rank on the sorted sample. Returns `0.0` for an empty set.
pub fn percentile(samples: &[f64], p: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let rank = ((p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank]
}

// `window.query(lookback)` for `PercentileSlot` in the engine's tests calls
// into this free function via the returned sample vec; exposed here so
// `SlidingWindow<PercentileSlot>::query` can be post-processed by callers
// without the engine itself knowing about percentiles.
impl PercentileSlot {
    pub fn percentile_of(samples: &[f64], p: f64) -> f64 {
        percentile(samples, p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_of_sorted_ramp() {
        let samples: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert_eq!(percentile(&samples, 50.0), 50.0);
        assert_eq!(percentile(&samples, 0.0), 0.0);
        assert_eq!(percentile(&samples, 100.0), 99.0);
    }

    #[test]
    fn percentile_of_empty_is_zero() {
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn reservoir_never_exceeds_capacity() {
        let slot = PercentileSlot::new();
        for i in 0..10_000 {
            slot.update(&(i as f64));
        }
        assert!(slot.snapshot().len() <= RESERVOIR_CAPACITY);
    }
}
