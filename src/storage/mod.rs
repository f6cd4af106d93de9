//! Storage Engine Module
//!
//! This module provides the sharded, expiring key/value store behind
//! [`Cache`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Cache                              │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐            │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...256   │            │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │            │
//! │  └────▲────┘ └────▲────┘ └────▲────┘ └────▲────┘            │
//! └───────┼───────────┼───────────┼───────────┼─────────────────┘
//!         │           │           │           │
//!   ┌─────┴───────────┴───────────┴───────────┴─────┐
//!   │      ExpirySweeper (one Tokio task/shard)     │
//!   └───────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Sharded Storage**: keys are routed by XXH3 to independent shards
//! - **RwLock**: Multiple concurrent readers, exclusive writers
//! - **Lazy Expiry**: Expired records are removed on access
//! - **Active Expiry**: Per-shard sweepers remove records nobody reads
//!
//! ## Example
//!
//! ```
//! use shardcache::Cache;
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let cache = Cache::new();
//!
//! cache.set("name", Bytes::from("Ariz"));
//! assert_eq!(cache.get("name"), Some(Bytes::from("Ariz")));
//!
//! cache.set_with_expire("session", Bytes::from("token123"), Duration::from_secs(3600));
//! assert!(cache.get_expire_time("session").is_some());
//! ```

pub mod engine;
pub mod expiry;
pub mod record;
pub mod router;
pub mod shard;
pub mod stats;

// Re-export commonly used types
pub use engine::Cache;
pub use record::Record;
pub use router::ShardRouter;
pub use stats::CacheStats;
