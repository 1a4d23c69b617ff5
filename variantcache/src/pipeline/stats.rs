//! Pipeline counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters updated by the pipeline.
#[derive(Debug, Default)]
pub struct PipelineStats {
    requests: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    origin_fetches: AtomicU64,
    derivations: AtomicU64,
    writes: AtomicU64,
    write_failures: AtomicU64,
    verification_failures: AtomicU64,
    deletes: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
///
/// `hits` and `misses` count store lookups, so a derived-variant miss that
/// finds the canonical image cached records one of each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStatsSnapshot {
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub origin_fetches: u64,
    pub derivations: u64,
    pub writes: u64,
    pub write_failures: u64,
    pub verification_failures: u64,
    pub deletes: u64,
    pub coalesced: u64,
}

impl PipelineStatsSnapshot {
    /// Fraction of lookups served from the store.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

macro_rules! counter {
    ($name:ident, $field:ident) => {
        pub(crate) fn $name(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl PipelineStats {
    counter!(record_request, requests);
    counter!(record_hit, hits);
    counter!(record_miss, misses);
    counter!(record_origin_fetch, origin_fetches);
    counter!(record_derivation, derivations);
    counter!(record_write, writes);
    counter!(record_write_failure, write_failures);
    counter!(record_verification_failure, verification_failures);
    counter!(record_delete, deletes);

    pub fn snapshot(&self, coalesced: u64) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            origin_fetches: self.origin_fetches.load(Ordering::Relaxed),
            derivations: self.derivations.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            verification_failures: self.verification_failures.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            coalesced,
        }
    }
}
