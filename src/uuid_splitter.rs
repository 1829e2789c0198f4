//! `UUIDRangeSplitter` (spec.md §4.G design notes, §8 monotonicity
//! invariant, §9 open question #1).
//!
//! Treats a UUID's 32 hex characters (dashes stripped) as a base-22
//! numeral whose digit alphabet is the ASCII-sorted union of `0-9`,
//! `A-F`, `a-f` (22 symbols) — preserving the string-sort order of UUIDs
//! as long as they are entirely one case. Per the decided contract
//! (§9 open question #1, DESIGN.md), callers MUST supply uppercase-hex
//! UUIDs; mixed-case input is out of contract.

/// Only this many leading digits are weighed; `22^27` already exceeds
/// `u64::MAX` by nine orders of magnitude, so the trailing five digits of
/// a 32-digit UUID contribute below any K's bucket resolution.
const WEIGHED_DIGITS: usize = 27;

pub struct UuidRangeSplitter {
    shards: usize,
}

impl UuidRangeSplitter {
    /// `shards` is K, the number of output shards; shard ids run `0..K`.
    pub fn new(shards: usize) -> Self {
        Self { shards: shards.max(1) }
    }

    fn digit_value(c: char) -> Option<u32> {
        match c {
            '0'..='9' => Some(c as u32 - '0' as u32),
            'A'..='F' => Some(10 + (c as u32 - 'A' as u32)),
            'a'..='f' => Some(16 + (c as u32 - 'a' as u32)),
            _ => None,
        }
    }

    /// Returns the shard index for `uuid`, or `None` if it contains a
    /// character outside the hex/dash alphabet.
    pub fn shard_for(&self, uuid: &str) -> Option<usize> {
        let digits: Vec<u32> =
            uuid.chars().filter(|c| *c != '-').map(Self::digit_value).collect::<Option<Vec<_>>>()?;
        if digits.is_empty() {
            return Some(0);
        }

        let take = digits.len().min(WEIGHED_DIGITS);
        let mut value: u128 = 0;
        let mut base_pow: u128 = 1;
        for &d in &digits[..take] {
            value = value * 22 + d as u128;
            base_pow *= 22;
        }

        let shard = (value * self.shards as u128) / base_pow;
        Some(shard as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_scenario() {
        let splitter = UuidRangeSplitter::new(22);
        assert_eq!(splitter.shard_for("A0000000-0000-0000-0000-000000000000"), Some(10));
    }

    #[test]
    fn zero_uuid_lands_in_shard_zero() {
        let splitter = UuidRangeSplitter::new(16);
        assert_eq!(splitter.shard_for("00000000-0000-0000-0000-000000000000"), Some(0));
    }

    #[test]
    fn all_f_uuid_does_not_reach_top_shard() {
        // Hex digits only span 16 of the 22-symbol alphabet (§9 open
        // question #1), so an all-uppercase-F UUID lands below K-1 even
        // though it is the lexicographically largest hex-only UUID.
        let splitter = UuidRangeSplitter::new(16);
        let shard = splitter.shard_for("FFFFFFFF-FFFF-FFFF-FFFF-FFFFFFFFFFFF").unwrap();
        assert!(shard < 16);
        assert!(shard >= splitter.shard_for("E0000000-0000-0000-0000-000000000000").unwrap());
    }

    #[test]
    fn monotonic_under_string_order() {
        let splitter = UuidRangeSplitter::new(10);
        let uuids = [
            "00000000-0000-0000-0000-000000000000",
            "30000000-0000-0000-0000-000000000000",
            "70000000-0000-0000-0000-000000000000",
            "A0000000-0000-0000-0000-000000000000",
            "D0000000-0000-0000-0000-000000000000",
            "FFFFFFFF-FFFF-FFFF-FFFF-FFFFFFFFFFFF",
        ];
        let shards: Vec<usize> = uuids.iter().map(|u| splitter.shard_for(u).unwrap()).collect();
        for pair in shards.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn rejects_non_hex_characters() {
        let splitter = UuidRangeSplitter::new(4);
        assert_eq!(splitter.shard_for("ZZZZZZZZ-0000-0000-0000-000000000000"), None);
    }
}
