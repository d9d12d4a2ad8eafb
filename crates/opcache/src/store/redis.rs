//! Redis-based entry store
//!
//! Stores entries in Redis with native per-key expiry (SETEX) and
//! enumerates with cursor-paginated SCAN so large key spaces never block
//! the server the way KEYS would. Keys are namespaced so a shared Redis can
//! host other tenants; the namespace never leaks above this module.
//!
//! Connection acquisition and command failures both map to
//! `StoreUnavailable`: from the caller's point of view a Redis that cannot
//! answer is unavailable, whatever the transport detail.

use std::time::Duration;

use async_trait::async_trait;
use redis::{Client, aio::MultiplexedConnection};
use tokio::time::timeout;

use crate::constants::{STORE_CONNECT_TIMEOUT_SECS, STORE_SCAN_PAGE_SIZE};
use crate::error::{Error, Result};
use crate::pattern;
use crate::store::{EntryMeta, EntryStore, HealthStatus, KeyInfo};

/// Redis-backed entry store
pub struct RedisEntryStore {
    client: Client,
    namespace: String,
}

impl RedisEntryStore {
    /// Connect to Redis and verify the connection with a PING.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `namespace` - prefix isolating this cache's keys
    ///
    /// # Errors
    /// Returns a configuration error for an unparseable URL and a store
    /// unavailable error when Redis cannot be reached.
    pub async fn connect(url: &str, namespace: &str) -> Result<Self> {
        tracing::info!("Connecting to Redis backing store at {}", url);

        let client = Client::open(url)
            .map_err(|e| Error::configuration_with_source("invalid Redis URL", e))?;

        let store = Self {
            client,
            namespace: namespace.to_string(),
        };

        let mut conn = store.connection().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::store_unavailable_with_source("redis ping failed", e))?;
        if pong != "PONG" {
            return Err(Error::store_unavailable("redis ping did not return PONG"));
        }

        tracing::info!("Redis connection established");
        Ok(store)
    }

    /// Create a full store key combining namespace and logical key
    #[inline]
    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Strip the namespace prefix from a store key
    fn logical_key<'a>(&self, full: &'a str) -> Option<&'a str> {
        full.strip_prefix(&self.namespace)
            .and_then(|rest| rest.strip_prefix(':'))
    }

    /// Acquire a connection with a bounded wait
    async fn connection(&self) -> Result<MultiplexedConnection> {
        timeout(
            Duration::from_secs(STORE_CONNECT_TIMEOUT_SECS),
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            Error::store_unavailable(format!(
                "timed out acquiring a redis connection after {STORE_CONNECT_TIMEOUT_SECS}s; \
                 check redis server availability"
            ))
        })?
        .map_err(|e| Error::store_unavailable_with_source("failed to establish redis connection", e))
    }

    /// Cursor-paginated SCAN collecting every key matching `match_pattern`.
    ///
    /// SCAN may return a key more than once across a rehash, so the result
    /// is sorted and deduplicated before use.
    async fn scan_keys(&self, match_pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let mut found = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, page): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(match_pattern)
                .arg("COUNT")
                .arg(STORE_SCAN_PAGE_SIZE)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    tracing::warn!("Redis SCAN failed for {}: {}", match_pattern, e);
                    Error::store_unavailable_with_source("redis scan failed", e)
                })?;
            found.extend(page);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        found.sort_unstable();
        found.dedup();
        Ok(found)
    }

    /// TTL and size for one full key; `None` when the key vanished.
    async fn entry_meta(
        &self,
        conn: &mut MultiplexedConnection,
        full_key: &str,
    ) -> Result<Option<(Option<u64>, u64)>> {
        let ttl: i64 = redis::cmd("TTL")
            .arg(full_key)
            .query_async(conn)
            .await
            .map_err(|e| Error::store_unavailable_with_source("redis ttl failed", e))?;
        if ttl == -2 {
            return Ok(None);
        }
        let size: u64 = redis::cmd("STRLEN")
            .arg(full_key)
            .query_async(conn)
            .await
            .map_err(|e| Error::store_unavailable_with_source("redis strlen failed", e))?;
        let remaining = u64::try_from(ttl).ok();
        Ok(Some((remaining, size)))
    }
}

#[async_trait]
impl EntryStore for RedisEntryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let full_key = self.full_key(key);

        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(&full_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::warn!("Redis GET failed for {}: {}", full_key, e);
                Error::store_unavailable_with_source("redis get failed", e)
            })?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let full_key = self.full_key(key);

        // SETEX rejects 0; sub-second TTLs round up to one second.
        let ttl_secs = ttl.as_secs().max(1);
        redis::cmd("SETEX")
            .arg(&full_key)
            .arg(ttl_secs)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| {
                tracing::warn!("Redis SETEX failed for {}: {}", full_key, e);
                Error::store_unavailable_with_source("redis set failed", e)
            })?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let full_key = self.full_key(key);

        redis::cmd("DEL")
            .arg(&full_key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| {
                tracing::warn!("Redis DEL failed for {}: {}", full_key, e);
                Error::store_unavailable_with_source("redis delete failed", e)
            })?;

        Ok(())
    }

    async fn keys(&self, key_pattern: &str) -> Result<Vec<String>> {
        pattern::validate(key_pattern)?;
        let match_pattern = self.full_key(key_pattern);
        let found = self.scan_keys(&match_pattern).await?;
        Ok(found
            .iter()
            .filter_map(|full| self.logical_key(full).map(str::to_string))
            .collect())
    }

    async fn scan(&self) -> Result<Vec<EntryMeta>> {
        let match_pattern = self.full_key("*");
        let found = self.scan_keys(&match_pattern).await?;

        let mut conn = self.connection().await?;
        let mut entries = Vec::with_capacity(found.len());
        for full in &found {
            let Some(key) = self.logical_key(full) else {
                continue;
            };
            // A key can expire between SCAN and inspection; skip it.
            if let Some((ttl_remaining_secs, size_bytes)) =
                self.entry_meta(&mut conn, full).await?
            {
                entries.push(EntryMeta {
                    key: key.to_string(),
                    ttl_remaining_secs,
                    size_bytes,
                });
            }
        }
        Ok(entries)
    }

    async fn info(&self, key: &str) -> Result<KeyInfo> {
        let mut conn = self.connection().await?;
        let full_key = self.full_key(key);
        match self.entry_meta(&mut conn, &full_key).await? {
            Some((ttl_remaining_secs, size_bytes)) => Ok(KeyInfo {
                exists: true,
                ttl_remaining_secs,
                size_bytes: Some(size_bytes),
            }),
            None => Ok(KeyInfo::absent()),
        }
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        let mut conn = self.connection().await?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::store_unavailable_with_source("redis ping failed", e))?;

        if pong == "PONG" {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    fn backend_type(&self) -> String {
        "redis".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: These tests require a running Redis server
    // Run with: docker run -d -p 6379:6379 redis:latest

    const URL: &str = "redis://localhost:6379";

    #[tokio::test]
    #[ignore] // Ignore by default - requires Redis
    async fn test_set_get_delete_round_trip() {
        let store = RedisEntryStore::connect(URL, "opcache_test").await.unwrap();

        store
            .set("balance:t1", vec![1, 2, 3], Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(
            store.get("balance:t1").await.unwrap(),
            Some(vec![1, 2, 3])
        );

        store.delete("balance:t1").await.unwrap();
        assert_eq!(store.get("balance:t1").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore] // Ignore by default - requires Redis
    async fn test_keys_respects_pattern_and_namespace() {
        let store = RedisEntryStore::connect(URL, "opcache_test").await.unwrap();

        store
            .set("balance:a", vec![1], Duration::from_secs(10))
            .await
            .unwrap();
        store
            .set("balance:b", vec![2], Duration::from_secs(10))
            .await
            .unwrap();
        store
            .set("validator:x", vec![3], Duration::from_secs(10))
            .await
            .unwrap();

        let keys = store.keys("balance:*").await.unwrap();
        assert_eq!(keys, vec!["balance:a", "balance:b"]);

        for key in ["balance:a", "balance:b", "validator:x"] {
            store.delete(key).await.unwrap();
        }
    }

    #[tokio::test]
    #[ignore] // Ignore by default - requires Redis
    async fn test_info_reports_ttl_and_size() {
        let store = RedisEntryStore::connect(URL, "opcache_test").await.unwrap();

        store
            .set("info:k", vec![0; 16], Duration::from_secs(30))
            .await
            .unwrap();

        let info = store.info("info:k").await.unwrap();
        assert!(info.exists);
        assert_eq!(info.size_bytes, Some(16));
        assert!(info.ttl_remaining_secs.unwrap() <= 30);

        assert!(!store.info("info:missing").await.unwrap().exists);
        store.delete("info:k").await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Ignore by default - requires Redis
    async fn test_health_check_pings() {
        let store = RedisEntryStore::connect(URL, "opcache_test").await.unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_store_unavailable() {
        // Nothing listens on this port; connect must fail with the
        // distinguishable unavailability condition, not an opaque error.
        let result = RedisEntryStore::connect("redis://127.0.0.1:1", "opcache_test").await;
        match result {
            Err(e) => assert!(e.is_store_unavailable()),
            Ok(_) => panic!("connect unexpectedly succeeded"),
        }
    }
}
