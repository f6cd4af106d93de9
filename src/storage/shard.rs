//! A Single Cache Shard
//!
//! Each shard owns one `RwLock<HashMap>` of records plus the state of its
//! own background sweeper. Shards never reference each other, so no lock
//! ordering is needed across them.
//!
//! ## Locking
//!
//! Reads take the read lock. If the record turns out to be expired, the read
//! lock is released and the write lock taken to remove it; the record is
//! checked again under the write lock because another caller may have
//! replaced it in between.
//!
//! A poisoned lock is recovered instead of propagated: records are replaced
//! whole, so a panic elsewhere can never leave a half-written entry behind.

use crate::storage::expiry::{ExpirySweeper, SweeperState};
use crate::storage::record::Record;
use crate::storage::stats::ShardCounters;
use std::collections::HashMap;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::trace;

/// One partition of the key space.
#[derive(Debug)]
pub struct Shard<V> {
    /// Position of this shard in the cache, used in log fields
    index: usize,
    data: RwLock<HashMap<String, Record<V>>>,
    sweeper: Mutex<SweeperState>,
    pub(crate) counters: ShardCounters,
}

impl<V> Shard<V> {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            data: RwLock::new(HashMap::new()),
            sweeper: Mutex::new(SweeperState::Idle),
            counters: ShardCounters::default(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Record<V>>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Record<V>>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweeper_state(&self) -> MutexGuard<'_, SweeperState> {
        self.sweeper.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up a valid record and projects it with `f`.
    ///
    /// Expired records are removed as a side effect.
    fn lookup<T>(&self, key: &str, f: impl Fn(&Record<V>) -> T) -> Option<T> {
        {
            let data = self.read();
            match data.get(key) {
                Some(record) if record.is_valid(Instant::now()) => {
                    ShardCounters::incr(&self.counters.hits);
                    return Some(f(record));
                }
                Some(_) => {}
                None => {
                    ShardCounters::incr(&self.counters.misses);
                    return None;
                }
            }
        }

        let mut data = self.write();
        match data.get(key) {
            Some(record) if record.is_valid(Instant::now()) => {
                // Replaced by a concurrent set while we waited for the lock
                ShardCounters::incr(&self.counters.hits);
                Some(f(record))
            }
            Some(_) => {
                data.remove(key);
                ShardCounters::incr(&self.counters.expired);
                ShardCounters::incr(&self.counters.misses);
                None
            }
            None => {
                ShardCounters::incr(&self.counters.misses);
                None
            }
        }
    }

    /// Returns the expiration instant of a valid record.
    pub fn get_expire_time(&self, key: &str) -> Option<Instant> {
        self.lookup(key, Record::expire_at)
    }

    /// Stores `value` under `key` for `ttl`, replacing any existing record.
    ///
    /// Returns `false` without touching the shard when `ttl` is zero.
    pub fn set(&self, key: String, value: V, ttl: Duration) -> bool {
        if ttl.is_zero() {
            ShardCounters::incr(&self.counters.rejected_sets);
            trace!(shard = self.index, key = %key, "Rejected set with zero duration");
            return false;
        }

        let record = Record::new(value, ttl, Instant::now());
        self.write().insert(key, record);
        ShardCounters::incr(&self.counters.sets);
        true
    }

    /// Removes `key`, returning whether a record (valid or not) was present.
    pub fn delete(&self, key: &str) -> bool {
        let existed = self.write().remove(key).is_some();
        if existed {
            ShardCounters::incr(&self.counters.deletes);
        }
        existed
    }

    /// Removes every record. Returns how many were removed.
    pub fn delete_all(&self) -> usize {
        let mut data = self.write();
        let removed = data.len();
        data.clear();
        removed
    }

    /// Removes every record that is expired at the start of the pass.
    ///
    /// `now` is sampled once, before the scan, and the whole pass holds the
    /// write lock. Returns the number of records removed.
    pub fn delete_expired(&self) -> usize {
        let now = Instant::now();

        let removed = {
            let mut data = self.write();
            let before = data.len();
            data.retain(|_, record| record.is_valid(now));
            before - data.len()
        };

        ShardCounters::add(&self.counters.expired, removed as u64);
        ShardCounters::incr(&self.counters.sweeps);
        removed
    }

    /// Number of records physically stored, including expired ones that
    /// have not been reclaimed yet.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a record is physically stored for `key`, ignoring validity.
    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Returns true while this shard's sweeper is running.
    pub fn is_sweeping(&self) -> bool {
        matches!(*self.sweeper_state(), SweeperState::Running(_))
    }

    /// Stops the sweeper if it is running. Returns whether it was running.
    pub fn stop_sweeper(&self) -> bool {
        let previous = std::mem::take(&mut *self.sweeper_state());
        match previous {
            SweeperState::Running(sweeper) => {
                sweeper.stop();
                true
            }
            SweeperState::Idle => false,
        }
    }
}

impl<V: Clone> Shard<V> {
    /// Returns a clone of the value stored under `key` if it has not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        self.lookup(key, |record| record.value().clone())
    }
}

impl<V: Send + Sync + 'static> Shard<V> {
    /// Spawns this shard's sweeper on `runtime` unless one is already running.
    ///
    /// Returns whether a new sweeper was started. The check and the spawn
    /// happen under the same lock, so concurrent callers start at most one.
    pub fn start_sweeper(self: &Arc<Self>, interval: Duration, runtime: &Handle) -> bool {
        let mut state = self.sweeper_state();
        if matches!(*state, SweeperState::Running(_)) {
            return false;
        }

        *state = SweeperState::Running(ExpirySweeper::spawn(Arc::clone(self), interval, runtime));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time;

    #[test]
    fn test_set_and_get() {
        let shard = Shard::new(0);

        assert!(shard.set("key".to_string(), "value", Duration::from_secs(60)));
        assert_eq!(shard.get("key"), Some("value"));
        assert_eq!(shard.get("missing"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let shard = Shard::new(0);

        shard.set("key".to_string(), 1, Duration::from_secs(60));
        shard.set("key".to_string(), 2, Duration::from_secs(60));

        assert_eq!(shard.get("key"), Some(2));
        assert_eq!(shard.len(), 1);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let shard = Shard::new(0);

        shard.set("key".to_string(), "old", Duration::from_secs(60));
        assert!(!shard.set("key".to_string(), "new", Duration::ZERO));

        // Prior value untouched
        assert_eq!(shard.get("key"), Some("old"));
        assert_eq!(
            shard
                .counters
                .rejected_sets
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn test_delete() {
        let shard = Shard::new(0);

        shard.set("key".to_string(), "value", Duration::from_secs(60));
        assert!(shard.delete("key"));
        assert_eq!(shard.get("key"), None);
        assert!(!shard.delete("key")); // Already deleted
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_reports_expired_record() {
        let shard = Shard::new(0);

        shard.set("key".to_string(), "value", Duration::from_millis(10));
        time::advance(Duration::from_millis(30)).await;

        // Still physically present, so delete reports it existed
        assert!(shard.contains_key("key"));
        assert!(shard.delete("key"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_expiry_removes_record() {
        let shard = Shard::new(0);

        shard.set("key".to_string(), "value", Duration::from_millis(10));
        assert!(shard.get_expire_time("key").is_some());

        time::advance(Duration::from_millis(30)).await;

        assert!(shard.contains_key("key"));
        assert_eq!(shard.get("key"), None);
        assert!(!shard.contains_key("key"));
        assert_eq!(shard.get_expire_time("key"), None);
    }

    #[test]
    fn test_delete_all() {
        let shard = Shard::new(0);

        shard.set("a".to_string(), 1, Duration::from_secs(60));
        shard.set("b".to_string(), 2, Duration::from_millis(1));

        assert_eq!(shard.delete_all(), 2);
        assert!(shard.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_expired() {
        let shard = Shard::new(0);

        shard.set("short1".to_string(), 1, Duration::from_millis(10));
        shard.set("short2".to_string(), 2, Duration::from_millis(10));
        shard.set("long".to_string(), 3, Duration::from_secs(60));

        time::advance(Duration::from_millis(50)).await;

        assert_eq!(shard.delete_expired(), 2);
        assert_eq!(shard.len(), 1);
        assert!(shard.contains_key("long"));
        assert_eq!(shard.delete_expired(), 0);
    }

    #[test]
    fn test_sweeper_idle_by_default() {
        let shard: Shard<()> = Shard::new(3);

        assert_eq!(shard.index(), 3);
        assert!(!shard.is_sweeping());
        assert!(!shard.stop_sweeper());
    }

    #[tokio::test]
    async fn test_start_sweeper_once() {
        let shard = Arc::new(Shard::<u8>::new(0));
        let runtime = Handle::current();

        assert!(shard.start_sweeper(Duration::from_secs(1), &runtime));
        assert!(!shard.start_sweeper(Duration::from_secs(1), &runtime));
        assert!(shard.is_sweeping());

        assert!(shard.stop_sweeper());
        assert!(!shard.is_sweeping());
        assert!(!shard.stop_sweeper());
    }
}
