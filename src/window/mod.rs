//! Sliding window engine (spec.md §4.I): a circular buffer of slot
//! records rotated by a dedicated pulse thread (per the concurrency-model
//! pivot recorded in SPEC_FULL.md — `std::thread::sleep` in a loop rather
//! than the teacher's `tokio::time::sleep`/`tokio::select!` idiom).

pub mod slot;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

pub use slot::{AverageSlot, CountSlot, MinMaxSlot, PercentileSlot, SumSlot};

/// A slot's combinator contract: `update` folds one event in, `snapshot`
/// extracts a queryable value, `combine` reduces several snapshots
/// (oldest to newest) into one.
pub trait SlotRecord: Send + Sync {
    type Event: Send + Sync;
    type Snapshot: Send + Sync + Clone;

    fn new() -> Self
    where
        Self: Sized;
    fn reset(&self);
    fn update(&self, event: &Self::Event);
    fn snapshot(&self) -> Self::Snapshot;
    fn combine(snapshots: Vec<Self::Snapshot>) -> Self::Snapshot;
}

/// Circular buffer of `R` slot records, each covering `slot_time` of
/// wall-clock time. `new_event` always lands on the current write slot;
/// `query(lookback)` reduces the last `lookback` slots, oldest to newest.
pub struct SlidingWindow<R: SlotRecord> {
    slots: Vec<R>,
    write_pos: AtomicUsize,
    cancelled: Arc<AtomicBool>,
    pulse: Mutex<Option<JoinHandle<()>>>,
}

impl<R: SlotRecord + 'static> SlidingWindow<R> {
    pub fn new(slot_count: usize, slot_time: Duration) -> Arc<Self> {
        let slot_count = slot_count.max(1);
        let slots = (0..slot_count).map(|_| R::new()).collect();
        let window = Arc::new(Self {
            slots,
            write_pos: AtomicUsize::new(0),
            cancelled: Arc::new(AtomicBool::new(false)),
            pulse: Mutex::new(None),
        });
        window.clone().spawn_pulse(slot_time);
        window
    }

    fn spawn_pulse(self: Arc<Self>, slot_time: Duration) {
        let window = self.clone();
        let handle = std::thread::spawn(move || {
            // Sleep in short increments rather than one long `slot_time`
            // sleep, so `close()` can interrupt promptly regardless of how
            // long a slot is.
            const POLL_INTERVAL: Duration = Duration::from_millis(10);
            loop {
                let mut slept = Duration::ZERO;
                while slept < slot_time {
                    if window.cancelled.load(Ordering::Acquire) {
                        return;
                    }
                    let remaining = slot_time - slept;
                    let step = remaining.min(POLL_INTERVAL);
                    std::thread::sleep(step);
                    slept += step;
                }
                if window.cancelled.load(Ordering::Acquire) {
                    return;
                }
                let slot_count = window.slots.len();
                let next = (window.write_pos.load(Ordering::Acquire) + 1) % slot_count;
                // Reset the incoming slot before publishing it as the write
                // position, so it never accumulates an event from the
                // previous rotation cycle.
                window.slots[next].reset();
                window.write_pos.store(next, Ordering::Release);
            }
        });
        *self.pulse.lock() = Some(handle);
    }

    /// Folds `event` into the current write slot.
    pub fn new_event(&self, event: &R::Event) {
        let pos = self.write_pos.load(Ordering::Acquire);
        self.slots[pos].update(event);
    }

    /// Combines the last `lookback` slots (clamped to the buffer size),
    /// oldest to newest.
    pub fn query(&self, lookback: usize) -> R::Snapshot {
        let slot_count = self.slots.len();
        let lookback = lookback.clamp(1, slot_count);
        let current = self.write_pos.load(Ordering::Acquire);

        let mut snapshots = Vec::with_capacity(lookback);
        let mut idx = current;
        for _ in 0..lookback {
            snapshots.push(self.slots[idx].snapshot());
            idx = (idx + slot_count - 1) % slot_count;
        }
        snapshots.reverse();
        R::combine(snapshots)
    }

    /// Combines every slot in the buffer — the full-window query.
    pub fn query_full(&self) -> R::Snapshot {
        self.query(self.slots.len())
    }

    pub fn close(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(handle) = self.pulse.lock().take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn count_slot_accumulates_within_current_slot() {
        let window = SlidingWindow::<CountSlot>::new(4, Duration::from_secs(60));
        for _ in 0..5 {
            window.new_event(&());
        }
        assert_eq!(window.query(1), 5);
        window.close();
    }

    #[test]
    fn rotation_moves_events_into_history() {
        let window = SlidingWindow::<CountSlot>::new(3, Duration::from_millis(50));
        window.new_event(&());
        window.new_event(&());
        std::thread::sleep(Duration::from_millis(70));
        window.new_event(&());
        // Full window covers both the old and new slot's events.
        assert_eq!(window.query_full(), 3);
        window.close();
    }

    #[test]
    fn sum_and_average_slots_combine_across_lookback() {
        let window = SlidingWindow::<SumSlot>::new(2, Duration::from_secs(60));
        window.new_event(&2.0);
        window.new_event(&3.0);
        assert_eq!(window.query(1), 5.0);
        window.close();

        let avg_window = SlidingWindow::<AverageSlot>::new(2, Duration::from_secs(60));
        avg_window.new_event(&2.0);
        avg_window.new_event(&4.0);
        let (sum, count) = avg_window.query(1);
        assert_eq!(sum, 6.0);
        assert_eq!(count, 2);
        avg_window.close();
    }

    #[test]
    fn min_max_slot_tracks_extremes() {
        let window = SlidingWindow::<MinMaxSlot>::new(2, Duration::from_secs(60));
        window.new_event(&4.0);
        window.new_event(&1.0);
        window.new_event(&9.0);
        let (min, max) = window.query(1);
        assert_eq!(min, 1.0);
        assert_eq!(max, 9.0);
        window.close();
    }

    #[test]
    fn percentile_slot_reports_a_value_within_range() {
        let window = SlidingWindow::<PercentileSlot>::new(1, Duration::from_secs(60));
        for i in 0..200 {
            window.new_event(&(i as f64));
        }
        let p50 = PercentileSlot::percentile_of(&window.query(1), 50.0);
        assert!((0.0..=199.0).contains(&p50));
        window.close();
    }

    #[test]
    fn close_stops_the_pulse_thread_promptly() {
        let window = SlidingWindow::<CountSlot>::new(4, Duration::from_millis(10));
        window.close();
    }
}
