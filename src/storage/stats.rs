//! Operation Counters
//!
//! Each shard keeps its own relaxed atomic counters so that recording a hit
//! never contends with another shard. [`CacheStats`] is the summed snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-shard counters.
#[derive(Debug, Default)]
pub(crate) struct ShardCounters {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub sets: AtomicU64,
    pub rejected_sets: AtomicU64,
    pub deletes: AtomicU64,
    pub expired: AtomicU64,
    pub sweeps: AtomicU64,
}

impl ShardCounters {
    #[inline]
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add(counter: &AtomicU64, n: u64) {
        if n > 0 {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            rejected_sets: self.rejected_sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics.
///
/// Counters are read with relaxed ordering, so a snapshot taken while other
/// threads are active is approximate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that found a valid record
    pub hits: u64,
    /// Reads that found nothing or an expired record
    pub misses: u64,
    /// Records written
    pub sets: u64,
    /// Writes rejected because of a zero duration
    pub rejected_sets: u64,
    /// Records removed by an explicit delete
    pub deletes: u64,
    /// Records removed because they expired (lazily or by a sweep)
    pub expired: u64,
    /// Sweep passes run over individual shards
    pub sweeps: u64,
}

impl CacheStats {
    pub(crate) fn accumulate(&mut self, counters: &ShardCounters) {
        let shard = counters.snapshot();
        self.hits += shard.hits;
        self.misses += shard.misses;
        self.sets += shard.sets;
        self.rejected_sets += shard.rejected_sets;
        self.deletes += shard.deletes;
        self.expired += shard.expired;
        self.sweeps += shard.sweeps;
    }

    /// Fraction of reads that were hits, or 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        let reads = self.hits + self.misses;
        if reads == 0 {
            0.0
        } else {
            self.hits as f64 / reads as f64
        }
    }
}
