//! Stored Records
//!
//! A [`Record`] pairs a cached value with the absolute instant at which it
//! stops being visible. Records are immutable: overwriting a key replaces
//! the whole record.
//!
//! Instants come from [`tokio::time::Instant`], which reads the tokio clock
//! when one is active. Pausing that clock (`tokio::time::pause`) therefore
//! freezes expiry as well, which is what the tests rely on.

use std::time::Duration;
use tokio::time::Instant;

/// Used in place of `now + ttl` when the addition would overflow (~30 years).
pub(crate) const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A cached value together with its expiration instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<V> {
    value: V,
    expire_at: Instant,
}

impl<V> Record<V> {
    /// Creates a record that expires `ttl` after `now`.
    ///
    /// A TTL too large to represent saturates to a far-future instant.
    pub fn new(value: V, ttl: Duration, now: Instant) -> Self {
        let expire_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);

        Self { value, expire_at }
    }

    /// Returns true while `now` is strictly before the expiration instant.
    #[inline]
    pub fn is_valid(&self, now: Instant) -> bool {
        now < self.expire_at
    }

    /// The stored value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// The absolute instant this record expires at.
    pub fn expire_at(&self) -> Instant {
        self.expire_at
    }

    /// Consumes the record and returns its value.
    pub fn into_value(self) -> V {
        self.value
    }
}
