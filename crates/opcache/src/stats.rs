//! Cache traffic statistics.
//!
//! Counters live on the tracker instance that the middleware owns. Two
//! caches never share a tracker, so tests and embedded deployments cannot
//! bleed numbers into each other.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::constants::SNAPSHOT_TOP_KEYS;

/// Access count for one cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyAccess {
    /// Full cache key, operation prefix included.
    pub key: String,
    /// Lifetime accesses (hits and misses both count).
    pub count: u64,
}

/// Point-in-time view of the tracker.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Reads served from the store.
    pub hits: u64,
    /// Reads that fell through to the executor.
    pub misses: u64,
    /// hits / (hits + misses), `0.0` when there has been no traffic.
    pub hit_rate: f64,
    /// Entries removed by pattern invalidation or a full clear.
    pub invalidations: u64,
    /// Most-accessed keys, count descending, key ascending on ties.
    pub top_keys: Vec<KeyAccess>,
}

/// Hit, miss, and invalidation counters with a capped per-key breakdown.
///
/// The per-key map is bounded: once it reaches capacity the least-used
/// entries are evicted, so a high-cardinality key space degrades the
/// breakdown but never the memory footprint. The aggregate counters are
/// exact regardless.
pub struct StatsTracker {
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
    access_counts: moka::sync::Cache<String, Arc<AtomicU64>>,
}

impl StatsTracker {
    /// Create a tracker that keeps per-key counts for at most
    /// `key_capacity` distinct keys.
    pub fn new(key_capacity: u64) -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            access_counts: moka::sync::Cache::builder()
                .max_capacity(key_capacity)
                .build(),
        }
    }

    /// Record a read served from the store.
    pub fn record_hit(&self, key: &str) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.bump(key);
    }

    /// Record a read that went to the executor.
    pub fn record_miss(&self, key: &str) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.bump(key);
    }

    /// Record `count` entries removed by an invalidation or clear.
    pub fn record_invalidations(&self, count: u64) {
        self.invalidations.fetch_add(count, Ordering::Relaxed);
    }

    /// Aggregate counters plus the default-size top-keys list.
    pub fn snapshot(&self) -> StatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };
        StatsSnapshot {
            hits,
            misses,
            hit_rate,
            invalidations: self.invalidations.load(Ordering::Relaxed),
            top_keys: self.top_keys(SNAPSHOT_TOP_KEYS),
        }
    }

    /// The `limit` most-accessed keys, count descending, then key ascending
    /// so equal counts come out in a stable order.
    pub fn top_keys(&self, limit: usize) -> Vec<KeyAccess> {
        let mut counts: Vec<KeyAccess> = self
            .access_counts
            .iter()
            .map(|(key, counter)| KeyAccess {
                key: key.as_ref().clone(),
                count: counter.load(Ordering::Relaxed),
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        counts.truncate(limit);
        counts
    }

    /// Every tracked key with its access count, unordered.
    pub fn access_counts(&self) -> Vec<KeyAccess> {
        self.access_counts
            .iter()
            .map(|(key, counter)| KeyAccess {
                key: key.as_ref().clone(),
                count: counter.load(Ordering::Relaxed),
            })
            .collect()
    }

    /// Zero every counter and forget every tracked key.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.invalidations.store(0, Ordering::Relaxed);
        self.access_counts.invalidate_all();
    }

    fn bump(&self, key: &str) {
        let counter = self
            .access_counts
            .get_with(key.to_string(), || Arc::new(AtomicU64::new(0)));
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_is_zero_without_traffic() {
        let tracker = StatsTracker::new(64);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.misses, 0);
        assert!((snapshot.hit_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_rate_reflects_traffic() {
        let tracker = StatsTracker::new(64);
        for _ in 0..8 {
            tracker.record_hit("balance:aaa");
        }
        for _ in 0..2 {
            tracker.record_miss("balance:bbb");
        }
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.hits, 8);
        assert_eq!(snapshot.misses, 2);
        assert!((snapshot.hit_rate - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_top_keys_order_by_count_then_key() {
        let tracker = StatsTracker::new(64);
        for _ in 0..3 {
            tracker.record_hit("validator:v1");
        }
        tracker.record_hit("balance:zzz");
        tracker.record_miss("balance:aaa");

        let top = tracker.top_keys(10);
        assert_eq!(top[0].key, "validator:v1");
        assert_eq!(top[0].count, 3);
        // Tied counts fall back to lexical key order.
        assert_eq!(top[1].key, "balance:aaa");
        assert_eq!(top[2].key, "balance:zzz");
    }

    #[test]
    fn test_per_key_breakdown_is_capped() {
        let tracker = StatsTracker::new(2);
        tracker.record_hit("a");
        tracker.record_hit("b");
        tracker.record_hit("c");
        tracker.access_counts.run_pending_tasks();

        assert!(tracker.top_keys(10).len() <= 2);
        // Aggregates stay exact even when the breakdown evicts.
        assert_eq!(tracker.snapshot().hits, 3);
    }

    #[test]
    fn test_invalidations_accumulate() {
        let tracker = StatsTracker::new(64);
        tracker.record_invalidations(3);
        tracker.record_invalidations(2);
        assert_eq!(tracker.snapshot().invalidations, 5);
    }

    #[test]
    fn test_reset_clears_everything() {
        let tracker = StatsTracker::new(64);
        tracker.record_hit("k");
        tracker.record_miss("k");
        tracker.record_invalidations(1);
        tracker.reset();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.misses, 0);
        assert_eq!(snapshot.invalidations, 0);
        assert!(snapshot.top_keys.is_empty());
    }
}
