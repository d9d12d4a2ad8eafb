//! Administrative cache surface.
//!
//! Inspection, invalidation, and warming. Unlike the execute path, these
//! operations surface store errors to the caller: an operator asking to
//! invalidate entries needs to know when the store did not comply.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::CLEAR_ALL_CONFIRM_PHRASE;
use crate::error::{Error, Result};
use crate::executor::OperationRegistry;
use crate::key;
use crate::middleware::OperationCache;
use crate::pattern;
use crate::stats::{KeyAccess, StatsSnapshot};
use crate::store::KeyInfo;

/// One entry an operator wants preloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmRequest {
    /// Registered operation name.
    pub operation: String,
    /// Parameters to execute it with.
    pub params: Map<String, Value>,
}

/// Why one warm entry failed.
#[derive(Debug, Clone, Serialize)]
pub struct WarmFailure {
    /// Operation name from the failing request.
    pub operation: String,
    /// Failure rendered for the operator.
    pub error: String,
}

/// Outcome of a warm run. Failures are reported per entry instead of
/// aborting the batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WarmReport {
    /// Entries asked for.
    pub requested: usize,
    /// Entries now sitting in the cache.
    pub succeeded: usize,
    /// Entries that could not be populated.
    pub failed: usize,
    /// Detail for every failed entry.
    pub failures: Vec<WarmFailure>,
}

/// Store-wide statistics for operators.
#[derive(Debug, Clone, Serialize)]
pub struct StatsOverview {
    /// Backend the entry store runs on.
    pub backend: String,
    /// Live entries in the store, absent when the store was unreachable.
    pub entry_count: Option<u64>,
    /// Total payload bytes, absent when the store was unreachable.
    pub total_size_bytes: Option<u64>,
    /// Traffic counters.
    pub stats: StatsSnapshot,
}

/// Access count aggregated over every key of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationAccess {
    /// Operation name, the key prefix before the digest.
    pub operation: String,
    /// Accesses summed across the operation's keys.
    pub count: u64,
}

/// Most-accessed keys, optionally rolled up by operation.
#[derive(Debug, Clone, Serialize)]
pub struct TopKeysReport {
    /// Hottest individual keys.
    pub keys: Vec<KeyAccess>,
    /// Present when grouping was requested.
    pub by_operation: Option<Vec<OperationAccess>>,
}

impl OperationCache {
    /// Existence, remaining TTL, and size for one key.
    pub async fn info(&self, cache_key: &str) -> Result<KeyInfo> {
        self.store.info(cache_key).await
    }

    /// Delete every entry matching `key_pattern` and return how many went.
    ///
    /// Requires `confirm` and a pattern narrower than the whole keyspace.
    pub async fn invalidate_pattern(&self, key_pattern: &str, confirm: bool) -> Result<u64> {
        if !confirm {
            return Err(Error::confirmation_required(
                "pattern invalidation deletes entries; pass confirm=true to proceed",
            ));
        }
        pattern::validate(key_pattern)?;
        if key_pattern == "*" {
            return Err(Error::invalid_pattern(
                "'*' would delete every entry; use clear_all for a full flush",
            ));
        }

        let keys = self.store.keys(key_pattern).await?;
        let count = self.delete_counted(&keys).await?;
        tracing::info!("Invalidated {} entries matching '{}'", count, key_pattern);
        Ok(count)
    }

    /// Delete every cache entry and return how many went.
    ///
    /// Requires `confirm` plus the exact confirmation phrase.
    pub async fn clear_all(&self, confirm: bool, confirm_phrase: &str) -> Result<u64> {
        if !confirm {
            return Err(Error::confirmation_required(format!(
                "clearing the cache deletes everything; pass confirm=true with the phrase \"{CLEAR_ALL_CONFIRM_PHRASE}\""
            )));
        }
        if confirm_phrase != CLEAR_ALL_CONFIRM_PHRASE {
            return Err(Error::invalid_confirmation(format!(
                "confirmation phrase must be exactly \"{CLEAR_ALL_CONFIRM_PHRASE}\""
            )));
        }

        let keys = self.store.keys("*").await?;
        let count = self.delete_counted(&keys).await?;
        tracing::info!("Cleared {} cache entries", count);
        Ok(count)
    }

    /// The hottest keys, optionally rolled up by operation prefix.
    pub fn top_keys(&self, limit: usize, group_by_operation: bool) -> TopKeysReport {
        let keys = self.stats.top_keys(limit);
        let by_operation = group_by_operation.then(|| {
            let mut totals: std::collections::HashMap<String, u64> = std::collections::HashMap::new();
            for access in self.stats.access_counts() {
                let operation = access
                    .key
                    .split_once(':')
                    .map_or(access.key.as_str(), |(prefix, _)| prefix)
                    .to_string();
                *totals.entry(operation).or_insert(0) += access.count;
            }
            let mut grouped: Vec<OperationAccess> = totals
                .into_iter()
                .map(|(operation, count)| OperationAccess { operation, count })
                .collect();
            grouped.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.operation.cmp(&b.operation)));
            grouped.truncate(limit);
            grouped
        });
        TopKeysReport { keys, by_operation }
    }

    /// Traffic counters plus live store totals.
    ///
    /// Never fails: when the store is unreachable the store-side numbers
    /// come back absent and the counters stand alone.
    pub async fn stats_overview(&self) -> StatsOverview {
        let (entry_count, total_size_bytes) = match self.store.scan().await {
            Ok(entries) => {
                let total = entries.iter().map(|entry| entry.size_bytes).sum();
                (Some(entries.len() as u64), Some(total))
            }
            Err(e) => {
                tracing::warn!("Store scan for stats failed: {}", e);
                (None, None)
            }
        };
        StatsOverview {
            backend: self.store.backend_type(),
            entry_count,
            total_size_bytes,
            stats: self.stats.snapshot(),
        }
    }

    /// Preload entries by running their operations through the normal
    /// population path.
    ///
    /// Entries warm concurrently; warming shares single-flight with live
    /// traffic and respects the TTL policy. It records neither hits nor
    /// misses; only real traffic moves those counters.
    pub async fn warm(
        &self,
        registry: &OperationRegistry,
        requests: Vec<WarmRequest>,
    ) -> Result<WarmReport> {
        if !self.enabled {
            return Err(Error::configuration("cannot warm a disabled cache"));
        }

        let mut report = WarmReport {
            requested: requests.len(),
            ..WarmReport::default()
        };
        let futures: Vec<_> = requests
            .into_iter()
            .map(|request| async move {
                let outcome = self.warm_one(registry, &request).await;
                (request, outcome)
            })
            .collect();
        for (request, outcome) in join_all(futures).await {
            match outcome {
                Ok(()) => report.succeeded += 1,
                Err(message) => {
                    report.failed += 1;
                    report.failures.push(WarmFailure {
                        operation: request.operation,
                        error: message,
                    });
                }
            }
        }
        tracing::info!(
            "Cache warm finished: {}/{} entries populated",
            report.succeeded,
            report.requested
        );
        Ok(report)
    }

    /// Delete `keys` one at a time, counting what lands.
    ///
    /// A failing delete stops the sweep; the deletions that already landed
    /// are recorded and logged before the error surfaces.
    async fn delete_counted(&self, keys: &[String]) -> Result<u64> {
        let mut deleted: u64 = 0;
        for key in keys {
            if let Err(e) = self.store.delete(key).await {
                self.stats.record_invalidations(deleted);
                tracing::warn!(
                    "Deletion sweep stopped after {} of {} entries: {}",
                    deleted,
                    keys.len(),
                    e
                );
                return Err(e);
            }
            deleted += 1;
        }
        self.stats.record_invalidations(deleted);
        Ok(deleted)
    }

    async fn warm_one(
        &self,
        registry: &OperationRegistry,
        request: &WarmRequest,
    ) -> std::result::Result<(), String> {
        let Some(operation) = registry.get(&request.operation) else {
            return Err(format!("unknown operation '{}'", request.operation));
        };
        let cache_key = key::derive(&request.operation, &request.params);
        let params = request.params.clone();
        self.populate(&cache_key, move || async move {
            operation.run(&params).await
        })
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::executor::Operation;
    use crate::stats::StatsTracker;
    use crate::store::{EntryMeta, EntryStore, HealthStatus, MemoryEntryStore};
    use crate::ttl::TtlPolicy;

    fn cache_over(store: Arc<MemoryEntryStore>) -> OperationCache {
        OperationCache::new(
            store as Arc<dyn EntryStore>,
            TtlPolicy::default_only(Duration::from_secs(60)),
        )
    }

    #[tokio::test]
    async fn test_destructive_operations_require_confirmation() {
        let cache = cache_over(Arc::new(MemoryEntryStore::new(100)));

        let err = cache.invalidate_pattern("balance:*", false).await.unwrap_err();
        assert!(matches!(err, Error::ConfirmationRequired { .. }));

        let err = cache.clear_all(false, CLEAR_ALL_CONFIRM_PHRASE).await.unwrap_err();
        assert!(matches!(err, Error::ConfirmationRequired { .. }));
    }

    #[tokio::test]
    async fn test_clear_all_rejects_wrong_phrase() {
        let store = Arc::new(MemoryEntryStore::new(100));
        store
            .set("k", b"v".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = cache_over(Arc::clone(&store));

        let err = cache.clear_all(true, "delete all cache data").await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfirmation { .. }));
        // Nothing was deleted.
        assert_eq!(store.keys("*").await.unwrap().len(), 1);

        let removed = cache.clear_all(true, CLEAR_ALL_CONFIRM_PHRASE).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.keys("*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_rejects_bare_wildcard() {
        let cache = cache_over(Arc::new(MemoryEntryStore::new(100)));
        let err = cache.invalidate_pattern("*", true).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn test_invalidation_is_counted() {
        let store = Arc::new(MemoryEntryStore::new(100));
        for key in ["balance:a", "balance:b", "validator:x"] {
            store
                .set(key, b"v".to_vec(), Duration::from_secs(60))
                .await
                .unwrap();
        }
        let cache = cache_over(Arc::clone(&store));

        let removed = cache.invalidate_pattern("balance:*", true).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.stats_snapshot().invalidations, 2);
        assert_eq!(store.keys("*").await.unwrap(), vec!["validator:x"]);
    }

    /// Store whose deletes succeed a fixed number of times, then fail.
    struct QuotaDeleteStore {
        inner: MemoryEntryStore,
        remaining: AtomicUsize,
    }

    impl QuotaDeleteStore {
        fn new(allowed_deletes: usize, inner: MemoryEntryStore) -> Self {
            Self {
                inner,
                remaining: AtomicUsize::new(allowed_deletes),
            }
        }
    }

    #[async_trait]
    impl EntryStore for QuotaDeleteStore {
        async fn get(&self, key: &str) -> crate::error::Result<Option<Vec<u8>>> {
            self.inner.get(key).await
        }

        async fn set(
            &self,
            key: &str,
            value: Vec<u8>,
            ttl: Duration,
        ) -> crate::error::Result<()> {
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> crate::error::Result<()> {
            if self.remaining.load(Ordering::SeqCst) == 0 {
                return Err(Error::store_unavailable("delete quota exhausted"));
            }
            self.remaining.fetch_sub(1, Ordering::SeqCst);
            self.inner.delete(key).await
        }

        async fn keys(&self, key_pattern: &str) -> crate::error::Result<Vec<String>> {
            self.inner.keys(key_pattern).await
        }

        async fn scan(&self) -> crate::error::Result<Vec<EntryMeta>> {
            self.inner.scan().await
        }

        async fn info(&self, key: &str) -> crate::error::Result<KeyInfo> {
            self.inner.info(key).await
        }

        async fn health_check(&self) -> crate::error::Result<HealthStatus> {
            self.inner.health_check().await
        }

        fn backend_type(&self) -> String {
            self.inner.backend_type()
        }
    }

    #[tokio::test]
    async fn test_partial_invalidation_still_counts_deletions() {
        let inner = MemoryEntryStore::new(100);
        for key in ["balance:a", "balance:b", "balance:c"] {
            inner
                .set(key, b"v".to_vec(), Duration::from_secs(60))
                .await
                .unwrap();
        }
        let cache = OperationCache::new(
            Arc::new(QuotaDeleteStore::new(2, inner)),
            TtlPolicy::default_only(Duration::from_secs(60)),
        );

        let err = cache.invalidate_pattern("balance:*", true).await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable { .. }));
        // balance:a and balance:b were gone before the store gave out, and
        // both show up in the counter.
        assert_eq!(cache.stats_snapshot().invalidations, 2);
    }

    #[tokio::test]
    async fn test_partial_clear_still_counts_deletions() {
        let inner = MemoryEntryStore::new(100);
        for key in ["balance:a", "balance:b", "validator:x"] {
            inner
                .set(key, b"v".to_vec(), Duration::from_secs(60))
                .await
                .unwrap();
        }
        let cache = OperationCache::new(
            Arc::new(QuotaDeleteStore::new(1, inner)),
            TtlPolicy::default_only(Duration::from_secs(60)),
        );

        let err = cache
            .clear_all(true, CLEAR_ALL_CONFIRM_PHRASE)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable { .. }));
        assert_eq!(cache.stats_snapshot().invalidations, 1);
    }

    #[tokio::test]
    async fn test_top_keys_grouping_rolls_up_by_operation() {
        let cache = cache_over(Arc::new(MemoryEntryStore::new(100)));
        cache.stats.record_hit("balance:aaa");
        cache.stats.record_hit("balance:aaa");
        cache.stats.record_miss("balance:bbb");
        cache.stats.record_hit("validator:x");

        let report = cache.top_keys(10, true);
        assert_eq!(report.keys[0].key, "balance:aaa");
        let grouped = report.by_operation.unwrap();
        assert_eq!(
            grouped,
            vec![
                OperationAccess {
                    operation: "balance".into(),
                    count: 3
                },
                OperationAccess {
                    operation: "validator".into(),
                    count: 1
                },
            ]
        );

        let flat = cache.top_keys(10, false);
        assert!(flat.by_operation.is_none());
    }

    struct DoublingOperation;

    #[async_trait]
    impl Operation for DoublingOperation {
        fn name(&self) -> &str {
            "double"
        }

        fn description(&self) -> &str {
            "doubles the n parameter"
        }

        async fn run(&self, params: &Map<String, Value>) -> crate::error::Result<Value> {
            let n = params.get("n").and_then(Value::as_i64).unwrap_or(0);
            Ok(json!(n * 2))
        }
    }

    #[tokio::test]
    async fn test_warm_populates_and_reports_partial_failure() {
        let store = Arc::new(MemoryEntryStore::new(100));
        let cache = cache_over(Arc::clone(&store));
        let mut registry = OperationRegistry::new();
        registry.register(Arc::new(DoublingOperation));

        let mut params = Map::new();
        params.insert("n".to_string(), json!(21));
        let requests = vec![
            WarmRequest {
                operation: "double".to_string(),
                params: params.clone(),
            },
            WarmRequest {
                operation: "missing".to_string(),
                params: Map::new(),
            },
        ];

        let report = cache.warm(&registry, requests).await.unwrap();
        assert_eq!(report.requested, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert!(report.failures[0].error.contains("unknown operation"));

        // Warming wrote the entry, so the next execute is a hit and the
        // warm run itself moved no traffic counters.
        assert_eq!(cache.stats_snapshot().misses, 0);
        let outcome = cache
            .execute("double", &params, || async { unreachable!() })
            .await
            .unwrap();
        assert!(outcome.was_cache_hit);
        assert_eq!(outcome.value, json!(42));
    }

    #[tokio::test]
    async fn test_warm_refuses_disabled_cache() {
        let store = Arc::new(MemoryEntryStore::new(100));
        let cache = OperationCache {
            store: store as Arc<dyn EntryStore>,
            policy: TtlPolicy::default_only(Duration::from_secs(60)),
            coordinator: crate::singleflight::PopulationCoordinator::new(),
            stats: Arc::new(StatsTracker::new(64)),
            enabled: false,
        };
        let registry = OperationRegistry::new();
        let err = cache.warm(&registry, Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_stats_overview_reports_store_totals() {
        let store = Arc::new(MemoryEntryStore::new(100));
        store
            .set("a", vec![0_u8; 10], Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set("b", vec![0_u8; 5], Duration::from_secs(60))
            .await
            .unwrap();
        let cache = cache_over(Arc::clone(&store));

        let overview = cache.stats_overview().await;
        assert_eq!(overview.backend, "memory");
        assert_eq!(overview.entry_count, Some(2));
        assert_eq!(overview.total_size_bytes, Some(15));
    }
}
