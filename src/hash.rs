//! The strong 64-bit hash shared by the shuffler (key sharding) and the
//! multi-file orchestrator (file sharding). A fixed keyed xxhash3-64 with a
//! constant seed (spec.md glossary: "Strong 64-bit hash").

use twox_hash::XxHash3_64;

/// Seed is a fixed constant so that two independent processes compute the
/// same shard for the same key bytes — sharding must be deterministic
/// across workers, not just within one.
const SEED: u64 = 0x9E3779B97F4A7C15;

/// Hashes `key` and masks the sign bit so the result is always usable with
/// `% n` without producing a negative remainder in signed arithmetic.
pub fn strong_hash64(key: &[u8]) -> u64 {
    XxHash3_64::oneshot_with_seed(SEED, key) & 0x7FFF_FFFF_FFFF_FFFF
}

/// Shards `key` into `0..n`. Panics if `n == 0`, mirroring `%` semantics.
pub fn shard_for(key: &[u8], n: usize) -> usize {
    (strong_hash64(key) % n as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_hash() {
        assert_eq!(strong_hash64(b"alpha"), strong_hash64(b"alpha"));
    }

    #[test]
    fn different_keys_usually_diverge() {
        assert_ne!(strong_hash64(b"alpha"), strong_hash64(b"beta"));
    }

    #[test]
    fn shard_is_always_in_range() {
        for key in ["a", "bb", "ccc", "dddd", "eeeee"] {
            let s = shard_for(key.as_bytes(), 7);
            assert!(s < 7);
        }
    }

    #[test]
    fn hash_is_never_negative_when_reinterpreted_signed() {
        for key in ["x", "y", "z", "longer-key-material"] {
            assert!((strong_hash64(key.as_bytes()) as i64) >= 0);
        }
    }
}
