//! Cache Behavior Tests
//!
//! End-to-end tests for the operation cache over the in-process store:
//! round trips, expiry, invalidation precision, single-flight collapse,
//! statistics arithmetic, and store-outage degradation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use opcache::store::{EntryMeta, HealthStatus, KeyInfo};
use opcache::{
    EntryStore, Error, MemoryEntryStore, OperationCache, Result, TtlPolicy, key,
};
use serde_json::{Map, Value, json};
use tokio::sync::Barrier;

fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn cache_with_default_ttl() -> OperationCache {
    OperationCache::new(
        Arc::new(MemoryEntryStore::new(10_000)),
        TtlPolicy::default_only(Duration::from_secs(60)),
    )
}

#[tokio::test]
async fn test_round_trip_executes_once() {
    let cache = cache_with_default_ttl();
    let p = params(&[("address", json!("cosmos1abc")), ("denom", json!("uatom"))]);
    let executions = Arc::new(AtomicUsize::new(0));

    for expected_hit in [false, true, true] {
        let executions = Arc::clone(&executions);
        let outcome = cache
            .execute("balance", &p, move || async move {
                executions.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"amount": "100", "denom": "uatom"}))
            })
            .await
            .unwrap();
        assert_eq!(outcome.was_cache_hit, expected_hit);
        assert_eq!(outcome.value, json!({"amount": "100", "denom": "uatom"}));
    }
    assert_eq!(executions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_expired_entry_executes_again() {
    let policy = TtlPolicy::new(
        vec![("balance".to_string(), Duration::from_millis(200))],
        Duration::from_secs(60),
    )
    .unwrap();
    let cache = OperationCache::new(Arc::new(MemoryEntryStore::new(100)), policy);
    let p = params(&[("address", json!("cosmos1abc"))]);
    let executions = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let executions = Arc::clone(&executions);
        cache
            .execute("balance", &p, move || async move {
                executions.fetch_add(1, Ordering::SeqCst);
                Ok(json!(1))
            })
            .await
            .unwrap();
    }
    assert_eq!(executions.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(350)).await;

    let executions_after = Arc::clone(&executions);
    let outcome = cache
        .execute("balance", &p, move || async move {
            executions_after.fetch_add(1, Ordering::SeqCst);
            Ok(json!(2))
        })
        .await
        .unwrap();
    assert!(!outcome.was_cache_hit);
    assert_eq!(executions.load(Ordering::SeqCst), 2);
}

#[test]
fn test_key_derivation_ignores_parameter_order() {
    let forward = params(&[("address", json!("cosmos1abc")), ("denom", json!("uatom"))]);
    let backward = params(&[("denom", json!("uatom")), ("address", json!("cosmos1abc"))]);
    let other = params(&[("address", json!("cosmos1abc")), ("denom", json!("uosmo"))]);

    assert_eq!(key::derive("balance", &forward), key::derive("balance", &backward));
    assert_ne!(key::derive("balance", &forward), key::derive("balance", &other));
    assert!(key::derive("balance", &forward).starts_with("balance:"));
}

#[tokio::test]
async fn test_pattern_invalidation_leaves_other_operations() {
    let cache = cache_with_default_ttl();

    for address in ["cosmos1abc", "cosmos1def"] {
        cache
            .execute("balance", &params(&[("address", json!(address))]), || async {
                Ok(json!("balance"))
            })
            .await
            .unwrap();
    }
    let validator_params = params(&[("id", json!("x"))]);
    cache
        .execute("validator", &validator_params, || async { Ok(json!("validator")) })
        .await
        .unwrap();

    let removed = cache.invalidate_pattern("balance:*", true).await.unwrap();
    assert_eq!(removed, 2);

    // The validator entry survived and still hits.
    let outcome = cache
        .execute("validator", &validator_params, || async { unreachable!() })
        .await
        .unwrap();
    assert!(outcome.was_cache_hit);

    // The balance entries are gone and execute again.
    let outcome = cache
        .execute("balance", &params(&[("address", json!("cosmos1abc"))]), || async {
            Ok(json!("fresh"))
        })
        .await
        .unwrap();
    assert!(!outcome.was_cache_hit);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_execute_once() {
    let cache = Arc::new(cache_with_default_ttl());
    let barrier = Arc::new(Barrier::new(50));
    let executions = Arc::new(AtomicUsize::new(0));
    let p = params(&[("address", json!("cosmos1abc"))]);

    let mut handles = Vec::new();
    for _ in 0..50 {
        let cache = Arc::clone(&cache);
        let barrier = Arc::clone(&barrier);
        let executions = Arc::clone(&executions);
        let p = p.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            cache
                .execute("balance", &p, move || async move {
                    executions.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(json!({"amount": "100"}))
                })
                .await
                .unwrap()
        }));
    }

    for handle in handles {
        let outcome = handle.await.unwrap();
        assert_eq!(outcome.value, json!({"amount": "100"}));
    }
    assert_eq!(executions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_hit_rate_arithmetic() {
    let cache = cache_with_default_ttl();
    assert!((cache.stats_snapshot().hit_rate - 0.0).abs() < f64::EPSILON);

    let a = params(&[("id", json!("a"))]);
    let b = params(&[("id", json!("b"))]);
    for _ in 0..6 {
        cache
            .execute("lookup", &a, || async { Ok(json!(1)) })
            .await
            .unwrap();
    }
    for _ in 0..4 {
        cache
            .execute("lookup", &b, || async { Ok(json!(2)) })
            .await
            .unwrap();
    }

    let snapshot = cache.stats_snapshot();
    assert_eq!(snapshot.hits, 8);
    assert_eq!(snapshot.misses, 2);
    assert!((snapshot.hit_rate - 0.8).abs() < f64::EPSILON);
    // Six accesses beat four, so the "a" key leads the breakdown.
    assert_eq!(snapshot.top_keys[0].key, key::derive("lookup", &a));
    assert_eq!(snapshot.top_keys[0].count, 6);
}

#[tokio::test]
async fn test_clear_all_guards_then_clears() {
    let cache = cache_with_default_ttl();
    let p = params(&[("id", json!(1))]);
    cache
        .execute("lookup", &p, || async { Ok(json!("v")) })
        .await
        .unwrap();

    let err = cache.clear_all(true, "please clear").await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfirmation { .. }));

    // Guarded failure deleted nothing.
    let outcome = cache
        .execute("lookup", &p, || async { unreachable!() })
        .await
        .unwrap();
    assert!(outcome.was_cache_hit);

    let removed = cache.clear_all(true, "DELETE ALL CACHE DATA").await.unwrap();
    assert_eq!(removed, 1);
    let outcome = cache
        .execute("lookup", &p, || async { Ok(json!("fresh")) })
        .await
        .unwrap();
    assert!(!outcome.was_cache_hit);
}

/// Store whose reads and writes always fail, for outage drills.
struct UnavailableStore;

#[async_trait]
impl EntryStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(Error::store_unavailable("store is down"))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<()> {
        Err(Error::store_unavailable("store is down"))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Err(Error::store_unavailable("store is down"))
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>> {
        Err(Error::store_unavailable("store is down"))
    }

    async fn scan(&self) -> Result<Vec<EntryMeta>> {
        Err(Error::store_unavailable("store is down"))
    }

    async fn info(&self, _key: &str) -> Result<KeyInfo> {
        Err(Error::store_unavailable("store is down"))
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        Ok(HealthStatus::Unhealthy)
    }

    fn backend_type(&self) -> String {
        "unavailable".to_string()
    }
}

#[tokio::test]
async fn test_store_outage_fails_open() {
    let cache = OperationCache::new(
        Arc::new(UnavailableStore),
        TtlPolicy::default_only(Duration::from_secs(60)),
    );
    let p = params(&[("id", json!(1))]);
    let executions = Arc::new(AtomicUsize::new(0));

    // Both reads and writes fail, yet callers still get their results.
    for _ in 0..2 {
        let executions = Arc::clone(&executions);
        let outcome = cache
            .execute("lookup", &p, move || async move {
                executions.fetch_add(1, Ordering::SeqCst);
                Ok(json!("computed"))
            })
            .await
            .unwrap();
        assert!(!outcome.was_cache_hit);
        assert_eq!(outcome.value, json!("computed"));
    }
    assert_eq!(executions.load(Ordering::SeqCst), 2);

    // Admin operations surface the outage instead of masking it.
    let err = cache.invalidate_pattern("lookup:*", true).await.unwrap_err();
    assert!(err.is_store_unavailable());

    // The overview degrades instead of failing.
    let overview = cache.stats_overview().await;
    assert_eq!(overview.entry_count, None);
    assert_eq!(overview.stats.misses, 2);
}
