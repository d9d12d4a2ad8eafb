//! # opcache
//!
//! Result caching for expensive operations, fronting a TTL-aware entry
//! store with single-flight population and an administrative surface.
//!
//! ## Features
//!
//! - **Deterministic Keys**: Canonical parameter hashing so equal calls
//!   share one `operation:digest` cache key
//! - **TTL Policy**: Ordered pattern rules resolve a per-key lifetime, most
//!   specific rule first
//! - **Single-Flight**: Concurrent misses on one key collapse into a single
//!   executor run that survives caller abandonment
//! - **Fail-Open**: Store outages degrade reads to pass-through execution
//!   and make writes best-effort; callers keep getting results
//! - **Pluggable Store**: Redis for shared deployments, an in-process
//!   store for tests and single-node use
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use opcache::{MemoryEntryStore, OperationCache, TtlPolicy};
//! use serde_json::{Map, json};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = OperationCache::new(
//!         Arc::new(MemoryEntryStore::new(10_000)),
//!         TtlPolicy::default_only(Duration::from_secs(300)),
//!     );
//!
//!     let mut params = Map::new();
//!     params.insert("address".to_string(), json!("cosmos1abc"));
//!     let outcome = cache
//!         .execute("balance", &params, || async {
//!             Ok(json!({"amount": "100", "denom": "uatom"}))
//!         })
//!         .await?;
//!     assert!(!outcome.was_cache_hit);
//!     Ok(())
//! }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`OperationCache`] | Read-through cache and administrative surface |
//! | [`EntryStore`] | Contract a storage backend implements |
//! | [`TtlPolicy`] | Compiled pattern-to-TTL rules |
//! | [`OperationRegistry`] | Named executors for `execute` and `warm` |

pub mod admin;
pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod key;
pub mod logging;
pub mod middleware;
pub mod pattern;
pub mod singleflight;
pub mod stats;
pub mod store;
pub mod ttl;

// Re-export core types for public API
pub use admin::{
    OperationAccess, StatsOverview, TopKeysReport, WarmFailure, WarmReport, WarmRequest,
};
pub use config::{
    AppConfig, CacheConfig, ConfigBuilder, ConfigLoader, LoggingConfig, ServerConfig,
    StoreBackend, TtlRuleConfig,
};
pub use error::{Error, Result, SharedError};
pub use executor::{Operation, OperationRegistry};
pub use middleware::{CacheOutcome, OperationCache};
pub use singleflight::PopulationCoordinator;
pub use stats::{KeyAccess, StatsSnapshot, StatsTracker};
pub use store::{
    EntryMeta, EntryStore, HealthStatus, KeyInfo, MemoryEntryStore, RedisEntryStore,
};
pub use ttl::{TtlPolicy, TtlRule};
