//! Caching middleware wrapped around operation executors.
//!
//! `OperationCache` is the single entry point callers use: it derives the
//! cache key, consults the entry store, collapses concurrent misses into one
//! execution, and writes the fresh result back with the policy TTL. Store
//! trouble never surfaces to callers on the read or write path; the cache
//! degrades to pass-through execution instead.

use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::key;
use crate::singleflight::{PopulationCoordinator, PopulationResult};
use crate::stats::{StatsSnapshot, StatsTracker};
use crate::store::EntryStore;
use crate::ttl::TtlPolicy;

/// Result of one `execute` call.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOutcome {
    /// The operation result, cached or freshly computed.
    pub value: Value,
    /// Whether the value came out of the store.
    pub was_cache_hit: bool,
}

/// Read-through, write-behind cache over an [`EntryStore`].
pub struct OperationCache {
    pub(crate) store: Arc<dyn EntryStore>,
    pub(crate) policy: TtlPolicy,
    pub(crate) coordinator: PopulationCoordinator,
    pub(crate) stats: Arc<StatsTracker>,
    pub(crate) enabled: bool,
}

impl OperationCache {
    /// Create an enabled cache with the default stats capacity.
    pub fn new(store: Arc<dyn EntryStore>, policy: TtlPolicy) -> Self {
        Self {
            store,
            policy,
            coordinator: PopulationCoordinator::new(),
            stats: Arc::new(StatsTracker::new(
                crate::constants::STATS_KEY_CAPACITY,
            )),
            enabled: true,
        }
    }

    /// Create a cache from configuration, compiling its TTL rules.
    pub fn from_config(config: &CacheConfig, store: Arc<dyn EntryStore>) -> Result<Self> {
        Ok(Self {
            store,
            policy: config.ttl_policy()?,
            coordinator: PopulationCoordinator::new(),
            stats: Arc::new(StatsTracker::new(config.stats_key_capacity)),
            enabled: config.enabled,
        })
    }

    /// Execute `operation` with caching.
    ///
    /// On a hit the executor never runs. On a miss the executor runs at most
    /// once across all concurrent callers of the same key, and the result is
    /// stored best-effort before anyone observes it. Executor failures are
    /// returned, never cached.
    pub async fn execute<F, Fut>(
        &self,
        operation: &str,
        params: &Map<String, Value>,
        executor: F,
    ) -> Result<CacheOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        if !self.enabled {
            let value = executor().await?;
            return Ok(CacheOutcome {
                value,
                was_cache_hit: false,
            });
        }

        let cache_key = key::derive(operation, params);

        match self.store.get(&cache_key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    self.stats.record_hit(&cache_key);
                    tracing::debug!("Cache hit for '{}'", cache_key);
                    return Ok(CacheOutcome {
                        value,
                        was_cache_hit: true,
                    });
                }
                Err(e) => {
                    // An undecodable entry counts as a miss and gets
                    // overwritten by the fresh result.
                    tracing::warn!("Discarding undecodable cache entry '{}': {}", cache_key, e);
                }
            },
            Ok(None) => {}
            Err(e) if e.is_store_unavailable() => {
                tracing::warn!("Cache read failed, executing uncached: {}", e);
            }
            Err(e) => return Err(e),
        }

        self.stats.record_miss(&cache_key);
        tracing::debug!("Cache miss for '{}'", cache_key);
        let value = self.populate(&cache_key, executor).await.map_err(Error::from)?;
        Ok(CacheOutcome {
            value,
            was_cache_hit: false,
        })
    }

    /// Run the executor under single-flight and store its result.
    ///
    /// The store write happens inside the population task, so it survives
    /// caller abandonment and runs exactly once per flight. A write failure
    /// is logged and the result served uncached.
    pub(crate) async fn populate<F, Fut>(&self, cache_key: &str, executor: F) -> PopulationResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let ttl = self.policy.resolve(cache_key);
        let store = Arc::clone(&self.store);
        let owned_key = cache_key.to_string();
        self.coordinator
            .run_once(cache_key, move || {
                let future = executor();
                async move {
                    let value = future.await?;
                    match serde_json::to_vec(&value) {
                        Ok(bytes) => {
                            if let Err(e) = store.set(&owned_key, bytes, ttl).await {
                                tracing::warn!(
                                    "Cache write for '{}' failed, serving uncached: {}",
                                    owned_key,
                                    e
                                );
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Could not encode result for '{}': {}", owned_key, e);
                        }
                    }
                    Ok(value)
                }
            })
            .await
    }

    /// Current aggregate statistics.
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Zero the statistics counters.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Whether reads and writes go through the store at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
