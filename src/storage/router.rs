//! Shard Routing
//!
//! Keys are assigned to shards by hashing them with XXH3 (64-bit) and
//! taking the remainder modulo the shard count. XXH3 is unseeded, so a key
//! lands on the same shard for as long as the shard count stays the same,
//! which for a [`Cache`](crate::Cache) is its whole lifetime.

use std::num::NonZeroUsize;
use xxhash_rust::xxh3::xxh3_64;

/// Maps keys to shard indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRouter {
    shard_count: NonZeroUsize,
}

impl ShardRouter {
    /// Creates a router over `shard_count` shards.
    pub fn new(shard_count: NonZeroUsize) -> Self {
        Self { shard_count }
    }

    /// Number of shards this router distributes keys over.
    pub fn shard_count(&self) -> usize {
        self.shard_count.get()
    }

    /// Returns the index of the shard that owns `key`.
    #[inline]
    pub fn route(&self, key: &str) -> usize {
        (xxh3_64(key.as_bytes()) % self.shard_count.get() as u64) as usize
    }
}
