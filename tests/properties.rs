//! Cross-module property tests for the invariants named in spec.md §8:
//! shuffler shard invariance under `HostPort` reordering, exact sampler
//! cardinality, UUID splitter monotonicity, and the scheduler's bin-packing
//! approximation bound. Each module also carries example-based unit tests
//! alongside its implementation; these exercise the same properties across
//! randomly generated inputs instead of fixed cases.

use proptest::prelude::*;

use pipeflow::host_port::{canonical_shard_ids, shard_id_of, HostPort};
use pipeflow::pipe::SyncPipe;
use pipeflow::rng::SeededRng;
use pipeflow::scheduler::{schedule, Job};
use pipeflow::source::SeqGen;
use pipeflow::stage::ExactSampler;
use pipeflow::uuid_splitter::UuidRangeSplitter;

fn hex_uuid_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec("[0-9A-F]", 32).prop_map(|chars| {
        let digits: String = chars.concat();
        format!(
            "{}-{}-{}-{}-{}",
            &digits[0..8],
            &digits[8..12],
            &digits[12..16],
            &digits[16..20],
            &digits[20..32]
        )
    })
}

proptest! {
    /// Shard assignment depends only on the *set* of workers, never on the
    /// order the caller happened to list them in (spec.md §8 scenario 5).
    #[test]
    fn shard_assignment_is_invariant_under_any_permutation(
        ports in proptest::collection::vec(1u16..65535, 2..8),
        seed in any::<u64>(),
    ) {
        let workers: Vec<HostPort> = ports
            .into_iter()
            .enumerate()
            .map(|(i, p)| HostPort::new(format!("host{i}"), p))
            .collect();

        let canonical = canonical_shard_ids(&workers);

        let mut shuffled = workers.clone();
        let mut rng = SeededRng::new(seed);
        for i in (1..shuffled.len()).rev() {
            let j = (rng.next_f64() * (i as f64 + 1.0)) as usize;
            shuffled.swap(i, j.min(i));
        }

        for (hp, id) in &canonical {
            prop_assert_eq!(shard_id_of(&shuffled, hp), Some(*id));
        }
    }

    /// `UuidRangeSplitter::shard_for` never reports a shard outside `0..K`
    /// for any well-formed uppercase-hex UUID.
    #[test]
    fn uuid_shard_always_within_range(uuid in hex_uuid_strategy(), shards in 1usize..64) {
        let splitter = UuidRangeSplitter::new(shards);
        let shard = splitter.shard_for(&uuid).expect("well-formed hex uuid");
        prop_assert!(shard < shards);
    }

    /// String order between two all-uppercase-hex UUIDs is preserved (or
    /// collapsed, never reversed) by the shard assignment.
    #[test]
    fn uuid_shard_is_monotonic_under_string_order(
        a in hex_uuid_strategy(),
        b in hex_uuid_strategy(),
    ) {
        let splitter = UuidRangeSplitter::new(64);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let shard_lo = splitter.shard_for(&lo).unwrap();
        let shard_hi = splitter.shard_for(&hi).unwrap();
        prop_assert!(shard_lo <= shard_hi);
    }

    /// `ExactSampler` always selects exactly `m` items when the declared
    /// `n` matches the true upstream length, for any `m <= n`.
    #[test]
    fn exact_sampler_always_selects_m_of_n(n in 1u64..200, m_frac in 0.0f64..1.0, seed in any::<u64>()) {
        let m = (m_frac * n as f64) as u64;
        let upstream = SeqGen::new(n as usize, |i| i as u64);
        let mut sampler = ExactSampler::new(upstream, n, m, SeededRng::new(seed));
        sampler.start().unwrap();
        let mut count = 0u64;
        while sampler.next().unwrap().is_some() {
            count += 1;
        }
        prop_assert_eq!(count, m);
    }

    /// The LPT scheduler's makespan never exceeds the (4/3 - 1/(3w))
    /// approximation bound relative to the optimal makespan lower bound
    /// (max(largest job, total weight / worker count)).
    #[test]
    fn schedule_respects_lpt_approximation_bound(
        weights in proptest::collection::vec(1u64..1000, 1..60),
        worker_count in 1usize..8,
    ) {
        let jobs: Vec<Job> = weights.iter().enumerate().map(|(i, &w)| Job::new(i, w)).collect();
        let assignment = schedule(&jobs, worker_count);

        let makespan = assignment.iter().map(|w| w.iter().map(|j| j.weight).sum::<u64>()).max().unwrap_or(0);
        let total: u64 = weights.iter().sum();
        let largest = *weights.iter().max().unwrap();
        let lower_bound = largest.max(total / worker_count as u64);

        let bound = (4.0 / 3.0) * (lower_bound.max(1) as f64);
        prop_assert!((makespan as f64) <= bound.ceil() + 1.0);

        let total_assigned: u64 = assignment.iter().flatten().map(|j| j.weight).sum();
        prop_assert_eq!(total_assigned, total);
    }
}
