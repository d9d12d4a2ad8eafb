//! In-process entry store
//!
//! Backed by a Moka future cache. Redis gives every key its own expiry
//! natively; here a per-entry [`Expiry`] policy does the same, so the two
//! backends agree that an expired key reads as absent. Always available:
//! no method of this store ever reports `StoreUnavailable`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use crate::error::Result;
use crate::pattern;
use crate::store::{EntryMeta, EntryStore, HealthStatus, KeyInfo};

/// A stored payload plus the expiry bookkeeping Moka's policy reads.
#[derive(Debug, Clone)]
struct StoredEntry {
    value: Vec<u8>,
    stored_at: Instant,
    ttl: Duration,
}

impl StoredEntry {
    fn remaining(&self) -> Option<Duration> {
        let remaining = self.ttl.saturating_sub(self.stored_at.elapsed());
        (remaining > Duration::ZERO).then_some(remaining)
    }
}

/// Expiry policy that takes each entry's own TTL.
struct PerEntryExpiry;

impl Expiry<String, StoredEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    // Overwrites restart the clock with the new entry's TTL.
    fn expire_after_update(
        &self,
        _key: &String,
        entry: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Moka-backed entry store for development, tests and cache-local use
pub struct MemoryEntryStore {
    cache: Cache<String, StoredEntry>,
}

impl MemoryEntryStore {
    /// Create a store holding at most `max_entries` entries
    pub fn new(max_entries: u64) -> Self {
        tracing::info!("Initializing in-process entry store (capacity {})", max_entries);
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryExpiry)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let entry = StoredEntry {
            value,
            stored_at: Instant::now(),
            ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn keys(&self, key_pattern: &str) -> Result<Vec<String>> {
        pattern::validate(key_pattern)?;
        self.cache.run_pending_tasks().await;
        let mut found: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, entry)| {
                pattern::key_matches(key_pattern, key) && entry.remaining().is_some()
            })
            .map(|(key, _)| key.as_ref().clone())
            .collect();
        found.sort_unstable();
        Ok(found)
    }

    async fn scan(&self) -> Result<Vec<EntryMeta>> {
        self.cache.run_pending_tasks().await;
        let mut entries: Vec<EntryMeta> = self
            .cache
            .iter()
            .filter_map(|(key, entry)| {
                entry.remaining().map(|remaining| EntryMeta {
                    key: key.as_ref().clone(),
                    ttl_remaining_secs: Some(remaining.as_secs()),
                    size_bytes: entry.value.len() as u64,
                })
            })
            .collect();
        entries.sort_unstable_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn info(&self, key: &str) -> Result<KeyInfo> {
        match self.cache.get(key).await {
            Some(entry) => match entry.remaining() {
                Some(remaining) => Ok(KeyInfo {
                    exists: true,
                    ttl_remaining_secs: Some(remaining.as_secs()),
                    size_bytes: Some(entry.value.len() as u64),
                }),
                None => Ok(KeyInfo::absent()),
            },
            None => Ok(KeyInfo::absent()),
        }
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        Ok(HealthStatus::Healthy)
    }

    fn backend_type(&self) -> String {
        "memory".to_string()
    }
}
