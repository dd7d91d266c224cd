//! String key-value cache interface used by the search services.
//!
//! Values are serialized by the caller. Backends may fail; callers treat any
//! [`CacheError`](crate::error::CacheError) as a miss.

use super::timed_cache::{CachePolicy, TimedCache};
use crate::clock::Clock;
use crate::error::CacheResult;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Entry count at which a write first sweeps out expired entries.
pub const DEFAULT_PURGE_THRESHOLD: usize = 10_000;

/// A key-value cache with per-entry expiration.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a live value.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a value, replacing any existing entry under `key`.
    async fn set(&self, key: &str, value: String, policy: CachePolicy) -> CacheResult<()>;
}

/// Process-local cache backed by [`TimedCache`].
///
/// Expired entries are dropped when looked up. Entries that are never read again
/// are swept on write once the store grows past a threshold, which then doubles
/// relative to what survived so sweeps stay amortized.
#[derive(Clone, Debug)]
pub struct InMemoryCacheStore {
    entries: TimedCache<String, String>,
    purge_threshold: usize,
    next_purge: Arc<AtomicUsize>,
}

impl InMemoryCacheStore {
    /// Create an empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_purge_threshold(clock, DEFAULT_PURGE_THRESHOLD)
    }

    /// Create an empty store that sweeps expired entries once it holds `threshold` of them.
    pub fn with_purge_threshold(clock: Arc<dyn Clock>, threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            entries: TimedCache::with_clock(clock),
            purge_threshold: threshold,
            next_purge: Arc::new(AtomicUsize::new(threshold)),
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries whose lifetime has ended.
    pub fn cleanup_expired(&self) {
        self.entries.cleanup_expired();
        let survivors = self.entries.len();
        self.next_purge.store(
            self.purge_threshold.max(survivors.saturating_mul(2)),
            Ordering::Relaxed,
        );
    }

    fn purge_if_due(&self) {
        let len = self.entries.len();
        if len < self.next_purge.load(Ordering::Relaxed) {
            return;
        }
        self.cleanup_expired();
        tracing::debug!(
            before = len,
            after = self.entries.len(),
            "Purged expired cache entries"
        );
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.get(&key.to_string()))
    }

    async fn set(&self, key: &str, value: String, policy: CachePolicy) -> CacheResult<()> {
        self.entries.insert_with_policy(key.to_string(), value, policy);
        self.purge_if_due();
        Ok(())
    }
}

/// A cache that never stores anything. Used when caching is disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCacheStore;

#[async_trait]
impl CacheStore for NullCacheStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _policy: CachePolicy) -> CacheResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_in_memory_store_round_trip() {
        let store = InMemoryCacheStore::new(Arc::new(clock()));
        store
            .set("k", "v".to_string(), CachePolicy::absolute(Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_in_memory_store_honours_policy() {
        let clock = clock();
        let store = InMemoryCacheStore::new(Arc::new(clock.clone()));
        store
            .set("k", "v".to_string(), CachePolicy::absolute(Duration::hours(1)))
            .await
            .unwrap();

        clock.advance(Duration::minutes(59));
        assert!(store.get("k").await.unwrap().is_some());

        clock.advance(Duration::minutes(1));
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_lookup_frees_the_entry() {
        let clock = clock();
        let store = InMemoryCacheStore::new(Arc::new(clock.clone()));
        store
            .set("k", "v".to_string(), CachePolicy::absolute(Duration::minutes(1)))
            .await
            .unwrap();

        clock.advance(Duration::minutes(2));
        assert_eq!(store.len(), 1);
        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_writes_past_threshold_sweep_unread_expired_entries() {
        let clock = clock();
        let store = InMemoryCacheStore::with_purge_threshold(Arc::new(clock.clone()), 4);
        let short = CachePolicy::absolute(Duration::minutes(1));
        for i in 0..3 {
            store.set(&format!("old{}", i), "v".to_string(), short).await.unwrap();
        }
        assert_eq!(store.len(), 3);

        clock.advance(Duration::minutes(5));
        store
            .set("fresh", "v".to_string(), CachePolicy::absolute(Duration::hours(1)))
            .await
            .unwrap();

        // The fourth write hit the threshold; only the live entry survives.
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("fresh").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_entries_and_raises_threshold() {
        let clock = clock();
        let store = InMemoryCacheStore::with_purge_threshold(Arc::new(clock.clone()), 2);
        let long = CachePolicy::absolute(Duration::hours(1));
        for i in 0..6 {
            store.set(&format!("k{}", i), "v".to_string(), long).await.unwrap();
        }

        assert_eq!(store.len(), 6);
        for i in 0..6 {
            assert!(store.get(&format!("k{}", i)).await.unwrap().is_some());
        }
    }

    #[test]
    fn test_null_store_always_misses() {
        let store = NullCacheStore;
        tokio_test::block_on(async {
            store
                .set("k", "v".to_string(), CachePolicy::absolute(Duration::hours(1)))
                .await
                .unwrap();
            assert_eq!(store.get("k").await.unwrap(), None);
        });
    }
}
