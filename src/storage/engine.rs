//! Sharded Cache Coordinator
//!
//! [`Cache`] owns a fixed array of shards, routes every key-level operation
//! to the shard that owns the key, and starts or stops all shard sweepers
//! together.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Cache                              │
//! │                  route(key) = xxh3(key) % N                 │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐            │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │            │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │            │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │            │
//! │  └────▲────┘ └────▲────┘ └────▲────┘ └────▲────┘            │
//! │       │           │           │           │                 │
//! │   sweeper 0   sweeper 1   sweeper 2   sweeper N             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Operations on different shards never contend. Sweeper start and stop are
//! serialized by a single lifecycle lock so that the sweepers either all run
//! or none do.

use crate::config::{CacheConfig, ConfigError};
use crate::storage::router::ShardRouter;
use crate::storage::shard::Shard;
use crate::storage::stats::CacheStats;
use bytes::Bytes;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// A sharded in-memory cache with per-record expiration.
///
/// This struct is designed to be wrapped in an `Arc` and shared across
/// threads and tasks. All operations take `&self`.
///
/// Expired records are invisible to reads immediately and are physically
/// removed either when read again or by the background sweepers started
/// with [`start_expiry_sweep`](Self::start_expiry_sweep).
///
/// Every operation except starting the sweepers works from plain threads.
/// The sweepers are Tokio tasks, so active expiry needs a running Tokio
/// runtime; from a synchronous `main` only lazy expiry and
/// [`delete_expired`](Self::delete_expired) reclaim records.
///
/// # Example
///
/// ```
/// use shardcache::Cache;
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// let cache = Cache::new();
///
/// // Set with the default expiration
/// cache.set("name", Bytes::from("Ariz"));
/// assert_eq!(cache.get("name"), Some(Bytes::from("Ariz")));
///
/// // Set with an explicit expiration
/// cache.set_with_expire("session", Bytes::from("abc123"), Duration::from_secs(60));
///
/// // A zero duration is rejected
/// assert!(!cache.set_with_expire("nope", Bytes::new(), Duration::ZERO));
/// ```
pub struct Cache<V = Bytes> {
    shards: Vec<Arc<Shard<V>>>,
    router: ShardRouter,
    default_expire: Duration,
    sweep_interval: Duration,

    /// Serializes sweeper start/stop across all shards
    lifecycle: Mutex<()>,
}

impl<V> std::fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("shards", &self.shards.len())
            .field("default_expire", &self.default_expire)
            .field("sweep_interval", &self.sweep_interval)
            .field("sweeping", &self.is_sweeping())
            .finish()
    }
}

impl<V> Default for Cache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Cache<V> {
    /// Creates a cache with the default configuration: 256 shards and a
    /// 50 second default expiration.
    pub fn new() -> Self {
        Self::from_config(&CacheConfig::default())
    }

    /// Creates a cache from `config` after validating it.
    pub fn with_config(config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_config(&config))
    }

    /// Builds the cache from an already validated configuration.
    fn from_config(config: &CacheConfig) -> Self {
        let shard_count = NonZeroUsize::new(config.shard_count).unwrap_or(NonZeroUsize::MIN);
        let shards = (0..shard_count.get())
            .map(|index| Arc::new(Shard::new(index)))
            .collect();

        Self {
            shards,
            router: ShardRouter::new(shard_count),
            default_expire: config.default_expire,
            sweep_interval: config.sweep_interval,
            lifecycle: Mutex::new(()),
        }
    }

    /// Index of the shard that owns `key`. Stable for the life of the cache.
    #[inline]
    pub fn shard_index(&self, key: &str) -> usize {
        self.router.route(key)
    }

    #[inline]
    fn shard(&self, key: &str) -> &Shard<V> {
        &self.shards[self.shard_index(key)]
    }

    fn lifecycle_guard(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of shards, fixed at construction.
    pub fn shard_count(&self) -> usize {
        self.router.shard_count()
    }

    /// Expiration applied by [`set`](Self::set).
    pub fn default_expire(&self) -> Duration {
        self.default_expire
    }

    /// Returns the expiration instant of `key` if it holds a valid record.
    ///
    /// An expired record is removed as a side effect, as with [`get`](Self::get).
    pub fn get_expire_time(&self, key: &str) -> Option<Instant> {
        self.shard(key).get_expire_time(key)
    }

    /// Stores `value` under `key` with the default expiration.
    ///
    /// Always returns `true`: the default expiration is validated at
    /// construction and can never be zero.
    pub fn set(&self, key: impl Into<String>, value: V) -> bool {
        self.set_with_expire(key, value, self.default_expire)
    }

    /// Stores `value` under `key` for `expire`, replacing any existing record.
    ///
    /// Returns `false`, leaving any existing record untouched, when `expire`
    /// is zero.
    pub fn set_with_expire(&self, key: impl Into<String>, value: V, expire: Duration) -> bool {
        let key = key.into();
        self.shard(&key).set(key, value, expire)
    }

    /// Deletes `key`.
    ///
    /// Returns `true` if a record was stored for it, even an expired one.
    pub fn delete(&self, key: &str) -> bool {
        self.shard(key).delete(key)
    }

    /// Removes every record from every shard.
    ///
    /// Running sweepers keep running.
    pub fn clear(&self) {
        let removed: usize = self.shards.iter().map(|shard| shard.delete_all()).sum();
        debug!(removed = removed, "Cache cleared");
    }

    /// Runs one sweep pass over every shard on the calling thread.
    ///
    /// Returns the number of expired records removed.
    pub fn delete_expired(&self) -> usize {
        self.shards.iter().map(|shard| shard.delete_expired()).sum()
    }

    /// Stops the sweepers of every running shard. Idle shards are untouched.
    ///
    /// Stopping does not wait for an in-progress pass; each loop exits the
    /// next time it is polled.
    pub fn stop_expiry_sweep(&self) -> &Self {
        let _guard = self.lifecycle_guard();

        let stopped = self
            .shards
            .iter()
            .filter(|shard| shard.stop_sweeper())
            .count();

        if stopped > 0 {
            info!(shards = stopped, "Background expiry sweepers stopped");
        }
        self
    }

    /// Returns true if any shard's sweeper is running.
    pub fn is_sweeping(&self) -> bool {
        self.shards.iter().any(|shard| shard.is_sweeping())
    }

    /// Number of records physically stored, including expired records that
    /// have not been reclaimed yet.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }

    /// Returns true if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.is_empty())
    }

    /// Returns a snapshot of the operation counters summed over all shards.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for shard in &self.shards {
            stats.accumulate(&shard.counters);
        }
        stats
    }
}

impl<V: Clone> Cache<V> {
    /// Returns the value stored under `key`.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    /// This implements "lazy expiry" - expired records are removed on access.
    pub fn get(&self, key: &str) -> Option<V> {
        self.shard(key).get(key)
    }
}

impl<V: Send + Sync + 'static> Cache<V> {
    /// Starts one background sweeper per shard, each removing that shard's
    /// expired records every `interval`.
    ///
    /// This is a no-op when `interval` is zero, when any sweeper is already
    /// running, or when called outside a Tokio runtime. Returns `self` for
    /// chaining.
    ///
    /// # Runtime
    ///
    /// Must be called from within a Tokio runtime. Outside one, nothing is
    /// started, a warning is logged, and [`is_sweeping`](Self::is_sweeping)
    /// stays `false`; call [`delete_expired`](Self::delete_expired)
    /// periodically instead.
    ///
    /// # Example
    ///
    /// ```
    /// use shardcache::Cache;
    /// use std::time::Duration;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let cache: Cache<String> = Cache::new();
    /// assert!(cache.start_expiry_sweep(Duration::from_secs(1)).is_sweeping());
    /// assert!(!cache.stop_expiry_sweep().is_sweeping());
    /// # }
    /// ```
    pub fn start_expiry_sweep(&self, interval: Duration) -> &Self {
        if interval.is_zero() {
            debug!("Ignoring expiry sweep start with zero interval");
            return self;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "Cannot start expiry sweepers outside a Tokio runtime");
                return self;
            }
        };

        let _guard = self.lifecycle_guard();

        if self.is_sweeping() {
            debug!("Expiry sweepers already running");
            return self;
        }

        for shard in &self.shards {
            shard.start_sweeper(interval, &runtime);
        }

        info!(
            shards = self.shards.len(),
            interval_ms = interval.as_millis() as u64,
            "Background expiry sweepers started"
        );
        self
    }

    /// Starts the sweepers with the configured sweep interval (default: 10s).
    pub fn start_default_expiry_sweep(&self) -> &Self {
        self.start_expiry_sweep(self.sweep_interval)
    }
}

impl<V> Drop for Cache<V> {
    fn drop(&mut self) {
        // Sweeper tasks hold their shard; stopping them releases it
        for shard in &self.shards {
            shard.stop_sweeper();
        }
    }
}
