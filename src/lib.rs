//! # shardcache - A Sharded In-Memory Cache with Expiry
//!
//! shardcache is an in-process key/value cache with time-based expiration,
//! built for many concurrent callers. Keys are spread over a fixed number of
//! independently locked shards, and every shard can run its own background
//! sweeper.
//!
//! ## Features
//!
//! - **Sharded Storage**: 256 shards by default, each behind its own RwLock
//! - **Per-Record Expiry**: Every record carries an absolute expiration instant
//! - **Lazy + Active Expiry**: Reads hide and remove expired records, sweepers
//!   reclaim the ones nobody reads
//! - **All-or-Nothing Sweepers**: All shard sweepers start together and stop together
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Cache                                      │
//! │                                                                         │
//! │  caller ──> ShardRouter ──> ┌──────────────────────────────────────────┐│
//! │             xxh3(key) % N   │  ┌────────┐ ┌────────┐ ┌────────┐        ││
//! │                             │  │Shard 0 │ │Shard 1 │ │...N    │        ││
//! │                             │  │RwLock  │ │RwLock  │ │shards  │        ││
//! │                             │  └───▲────┘ └───▲────┘ └───▲────┘        ││
//! │                             └──────┼──────────┼──────────┼─────────────┘│
//! │                                    │          │          │              │
//! │                             ┌──────┴──────────┴──────────┴────────────┐ │
//! │                             │  ExpirySweeper per shard (Tokio tasks)  │ │
//! │                             └─────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use shardcache::{Cache, CacheConfig};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache: Cache<String> = CacheConfig::new()
//!     .with_default_expire(Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//!
//! cache.set("user:1", "Ariz".to_string());
//! assert_eq!(cache.get("user:1").as_deref(), Some("Ariz"));
//!
//! // Reclaim expired records in the background every second
//! cache.start_expiry_sweep(Duration::from_secs(1));
//! assert!(cache.is_sweeping());
//!
//! cache.stop_expiry_sweep();
//! # }
//! ```
//!
//! ## Lazy + Active Expiry
//!
//! Records expire in two ways:
//! 1. **Lazy**: When a key is read, an expired record is reported absent and removed
//! 2. **Active**: Background sweepers periodically scan their shard for expired records
//!
//! Both paths share [`Record::is_valid`], so they always agree on what has expired.
//!
//! ## Module Overview
//!
//! - [`storage`]: Shards, routing, records and the sweepers
//! - [`config`]: Construction-time configuration

pub mod config;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::{
    CacheConfig, ConfigError, DEFAULT_EXPIRE, DEFAULT_SHARD_COUNT, DEFAULT_SWEEP_INTERVAL,
};
pub use storage::{Cache, CacheStats, Record, ShardRouter};

/// Version of shardcache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
