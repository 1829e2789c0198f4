//! `HostPort` (spec.md §3, §6): an immutable `(host, port)` pair, total
//! ordered by host then port so shard-id assignment (§4.H) can be derived
//! from a canonical sort rather than input list position.

use std::fmt;

use crate::error::PipeError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

impl HostPort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// Parses `HOST:PORT`; rejects a missing or non-numeric port.
    pub fn parse(s: &str) -> Result<Self, PipeError> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| PipeError::validation(format!("missing ':' in host:port '{s}'")))?;
        if host.is_empty() {
            return Err(PipeError::validation("empty host"));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| PipeError::validation(format!("non-numeric port in '{s}'")))?;
        Ok(Self { host: host.to_string(), port })
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Canonical shard-id assignment (spec.md §4.H, §9): sort `workers` into
/// canonical order, then a worker's shard id is its position in that
/// sorted list — never its position in the caller's input order.
pub fn canonical_shard_ids(workers: &[HostPort]) -> Vec<(HostPort, usize)> {
    let mut sorted = workers.to_vec();
    sorted.sort();
    sorted.into_iter().enumerate().map(|(id, hp)| (hp, id)).collect()
}

/// Looks up `self_addr`'s shard id within the canonical ordering of
/// `workers` (which must contain `self_addr`).
pub fn shard_id_of(workers: &[HostPort], self_addr: &HostPort) -> Option<usize> {
    canonical_shard_ids(workers).into_iter().find(|(hp, _)| hp == self_addr).map(|(_, id)| id)
}
