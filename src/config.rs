//! Cache Configuration
//!
//! [`CacheConfig`] collects the construction-time settings of a
//! [`Cache`](crate::Cache). The shard count cannot change after
//! construction; the default expiration and sweep interval can only be
//! chosen here.
//!
//! ## Example
//!
//! ```
//! use shardcache::{Cache, CacheConfig};
//! use std::time::Duration;
//!
//! let cache: Cache<String> = CacheConfig::new()
//!     .with_default_expire(Duration::from_secs(300))
//!     .with_shard_count(64)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(cache.shard_count(), 64);
//! ```

use crate::storage::Cache;
use std::time::Duration;
use thiserror::Error;

/// Default lifetime of a record written with [`Cache::set`].
pub const DEFAULT_EXPIRE: Duration = Duration::from_secs(50);

/// Default interval used by [`Cache::start_default_expiry_sweep`].
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Default number of shards.
pub const DEFAULT_SHARD_COUNT: usize = 256;

/// Errors reported when validating a [`CacheConfig`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A cache needs at least one shard
    #[error("shard count must be greater than zero")]
    ZeroShardCount,

    /// Records written with the default duration would never be stored
    #[error("default expiration must be greater than zero")]
    ZeroDefaultExpire,

    /// A sweeper cannot tick on a zero interval
    #[error("sweep interval must be greater than zero")]
    ZeroSweepInterval,
}

/// Construction-time settings for a [`Cache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of records written without an explicit duration (default: 50s)
    pub default_expire: Duration,

    /// Number of independent shards (default: 256)
    pub shard_count: usize,

    /// Interval used by [`Cache::start_default_expiry_sweep`] (default: 10s)
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_expire: DEFAULT_EXPIRE,
            shard_count: DEFAULT_SHARD_COUNT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lifetime of records written with [`Cache::set`].
    pub fn with_default_expire(mut self, expire: Duration) -> Self {
        self.default_expire = expire;
        self
    }

    /// Sets the fixed number of shards.
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Sets the interval used by [`Cache::start_default_expiry_sweep`].
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Checks that every setting is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shard_count == 0 {
            return Err(ConfigError::ZeroShardCount);
        }
        if self.default_expire.is_zero() {
            return Err(ConfigError::ZeroDefaultExpire);
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::ZeroSweepInterval);
        }
        Ok(())
    }

    /// Validates the configuration and builds a cache from it.
    pub fn build<V>(self) -> Result<Cache<V>, ConfigError> {
        Cache::with_config(self)
    }
}
