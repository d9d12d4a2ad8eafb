//! Entry stores: thin wrappers over a key/value backing store.
//!
//! The [`EntryStore`] trait isolates the rest of the subsystem from the
//! backing store's native protocol. Two implementations are provided:
//! [`redis::RedisEntryStore`] for the distributed backing store and
//! [`memory::MemoryEntryStore`] for development, tests and cache-local
//! deployments. Expired keys are indistinguishable from absent keys in
//! every method.

pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

pub use memory::MemoryEntryStore;
pub use redis::RedisEntryStore;

/// Inspection record for one stored entry
#[derive(Debug, Clone, Serialize)]
pub struct EntryMeta {
    /// Logical cache key
    pub key: String,
    /// Seconds until expiry; `None` when the store reports no expiry
    pub ttl_remaining_secs: Option<u64>,
    /// Approximate stored payload size
    pub size_bytes: u64,
}

/// Inspection record for a single key lookup
#[derive(Debug, Clone, Serialize)]
pub struct KeyInfo {
    /// Whether the key currently exists (expired counts as absent)
    pub exists: bool,
    /// Seconds until expiry; `None` when absent or without expiry
    pub ttl_remaining_secs: Option<u64>,
    /// Stored payload size; `None` when absent
    pub size_bytes: Option<u64>,
}

impl KeyInfo {
    /// Record for a key that does not exist
    pub fn absent() -> Self {
        Self {
            exists: false,
            ttl_remaining_secs: None,
            size_bytes: None,
        }
    }
}

/// Store health states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// Store reachable and responsive
    Healthy,
    /// Store reachable but in a degraded state
    Degraded,
    /// Store unreachable or misbehaving
    Unhealthy,
}

/// Abstraction over the backing key/value store.
///
/// Every method may block on network I/O and must be callable from many
/// tasks concurrently. Connectivity failures surface as
/// [`Error::StoreUnavailable`](crate::Error::StoreUnavailable) so callers
/// can fail open.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Fetch a value. `Ok(None)` covers both never-stored and expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value with expiry, overwriting any existing entry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Enumerate keys matching a validated pattern.
    ///
    /// One pass over a snapshot of the key space at call time, paginated
    /// internally against the backing store and returned as a single
    /// sorted sequence of logical keys.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Enumerate all entries with TTL and size, for inspection.
    async fn scan(&self) -> Result<Vec<EntryMeta>>;

    /// Inspect a single key.
    async fn info(&self, key: &str) -> Result<KeyInfo>;

    /// Check that the backing store is reachable.
    async fn health_check(&self) -> Result<HealthStatus>;

    /// Backend identifier for diagnostics
    fn backend_type(&self) -> String;
}
