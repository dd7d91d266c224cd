//! Time-based cache with TTL (Time To Live) and sliding expiration support.
//!
//! This module provides a thread-safe cache that expires entries after an absolute
//! lifetime and, optionally, after a period without reads. Time is read from an
//! injected [`Clock`] so expiry is deterministic under test.

use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

/// How long an entry stays live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Absolute lifetime measured from insertion.
    pub ttl: Duration,
    /// Optional idle window; every hit pushes it forward, never past `ttl`.
    pub sliding: Option<Duration>,
}

impl CachePolicy {
    /// Absolute expiry only.
    pub fn absolute(ttl: Duration) -> Self {
        Self { ttl, sliding: None }
    }

    /// Absolute expiry with a sliding idle window.
    pub fn sliding(ttl: Duration, sliding: Duration) -> Self {
        Self {
            ttl,
            sliding: Some(sliding),
        }
    }
}

/// A cache entry with its timestamps.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
    policy: CachePolicy,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        if now - self.inserted_at >= self.policy.ttl {
            return false;
        }
        match self.policy.sliding {
            Some(window) => now - self.last_access < window,
            None => true,
        }
    }
}

/// A thread-safe cache with time-based expiration.
///
/// Entries are expired after their policy's TTL, or earlier when a sliding window
/// elapses without a read. A lookup that finds an expired entry drops it. The cache
/// can be cloned cheaply (uses Arc internally) and clones share the same entries.
#[derive(Clone)]
pub struct TimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    cache: Arc<RwLock<HashMap<K, CacheEntry<V>>>>,
    clock: Arc<dyn Clock>,
}

impl<K, V> TimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Insert a value with its own expiration policy.
    ///
    /// If a value with the same key already exists, it will be replaced.
    pub fn insert_with_policy(&self, key: K, value: V, policy: CachePolicy) {
        let now = self.clock.now();
        let entry = CacheEntry {
            value,
            inserted_at: now,
            last_access: now,
            policy,
        };

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, entry);
        }
    }

    /// Get a value from the cache if it exists and hasn't expired.
    ///
    /// A hit refreshes the entry's sliding window; an expired entry is removed.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut cache = self.cache.write().ok()?;

        let live = cache.get(key)?.is_live(now);
        if !live {
            cache.remove(key);
            return None;
        }

        let entry = cache.get_mut(key)?;
        entry.last_access = now;
        Some(entry.value.clone())
    }

    /// Remove all expired entries from the cache.
    pub fn cleanup_expired(&self) {
        let now = self.clock.now();

        if let Ok(mut cache) = self.cache.write() {
            cache.retain(|_, entry| entry.is_live(now));
        }
    }

    /// Get the number of entries in the cache (including expired ones).
    pub fn len(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> std::fmt::Debug for TimedCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCache")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;
    use std::thread;

    fn manual_cache() -> (TimedCache<&'static str, &'static str>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
        let cache = TimedCache::with_clock(Arc::new(clock.clone()));
        (cache, clock)
    }

    fn minute() -> CachePolicy {
        CachePolicy::absolute(Duration::seconds(60))
    }

    #[test]
    fn test_insert_and_get() {
        let (cache, _clock) = manual_cache();
        cache.insert_with_policy("key1", "value1", minute());

        assert_eq!(cache.get(&"key1"), Some("value1"));
        assert_eq!(cache.get(&"key2"), None);
    }

    #[test]
    fn test_ttl_expiration() {
        let (cache, clock) = manual_cache();
        cache.insert_with_policy("key1", "value1", minute());

        clock.advance(Duration::seconds(59));
        assert_eq!(cache.get(&"key1"), Some("value1"));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get(&"key1"), None);
    }

    #[test]
    fn test_expired_lookup_drops_entry() {
        let (cache, clock) = manual_cache();
        cache.insert_with_policy("key1", "value1", minute());
        cache.insert_with_policy("key2", "value2", CachePolicy::absolute(Duration::hours(1)));

        clock.advance(Duration::minutes(2));
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.get(&"key1"), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"key2"), Some("value2"));
    }

    #[test]
    fn test_sliding_window_expires_idle_entries() {
        let (cache, clock) = manual_cache();
        cache.insert_with_policy(
            "page",
            "result",
            CachePolicy::sliding(Duration::seconds(300), Duration::seconds(60)),
        );

        clock.advance(Duration::seconds(61));
        assert_eq!(cache.get(&"page"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sliding_window_is_refreshed_by_hits_but_capped_by_ttl() {
        let (cache, clock) = manual_cache();
        cache.insert_with_policy(
            "page",
            "result",
            CachePolicy::sliding(Duration::seconds(300), Duration::seconds(60)),
        );

        // Read every 50s: the sliding window never lapses...
        for _ in 0..5 {
            clock.advance(Duration::seconds(50));
            assert_eq!(cache.get(&"page"), Some("result"));
        }

        // ...but the absolute TTL still ends it at 300s.
        clock.advance(Duration::seconds(50));
        assert_eq!(cache.get(&"page"), None);
    }

    #[test]
    fn test_policies_are_per_entry() {
        let (cache, clock) = manual_cache();
        cache.insert_with_policy("long", "lived", CachePolicy::absolute(Duration::hours(1)));
        cache.insert_with_policy("short", "lived", CachePolicy::absolute(Duration::seconds(10)));

        clock.advance(Duration::minutes(30));
        assert_eq!(cache.get(&"long"), Some("lived"));
        assert_eq!(cache.get(&"short"), None);
    }

    #[test]
    fn test_cleanup_expired() {
        let (cache, clock) = manual_cache();
        cache.insert_with_policy("key1", "value1", CachePolicy::absolute(Duration::seconds(1)));
        cache.insert_with_policy("key2", "value2", CachePolicy::absolute(Duration::seconds(1)));

        clock.advance(Duration::seconds(2));

        // Still 2 entries (expired but not looked up)
        assert_eq!(cache.len(), 2);

        cache.cleanup_expired();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_update_value_resets_timestamps() {
        let (cache, clock) = manual_cache();
        cache.insert_with_policy("key1", "value1", minute());

        clock.advance(Duration::seconds(45));
        cache.insert_with_policy("key1", "value2", minute());

        clock.advance(Duration::seconds(45));
        assert_eq!(cache.get(&"key1"), Some("value2"));
    }

    #[test]
    fn test_clone_cache() {
        let (cache1, _clock) = manual_cache();
        cache1.insert_with_policy("key1", "value1", minute());

        // Clone shares the same underlying cache
        let cache2 = cache1.clone();
        assert_eq!(cache2.get(&"key1"), Some("value1"));

        cache2.insert_with_policy("key2", "value2", minute());
        assert_eq!(cache1.get(&"key2"), Some("value2"));
    }

    #[test]
    fn test_concurrent_access() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
        let cache: TimedCache<String, String> = TimedCache::with_clock(Arc::new(clock));
        let cache_clone = cache.clone();

        let handle = thread::spawn(move || {
            for i in 0..100 {
                cache_clone.insert_with_policy(format!("key{}", i), format!("value{}", i), minute());
            }
        });

        for i in 100..200 {
            cache.insert_with_policy(format!("key{}", i), format!("value{}", i), minute());
        }

        handle.join().unwrap();

        assert_eq!(cache.len(), 200);
    }

    #[test]
    fn test_debug_format() {
        let (cache, _clock) = manual_cache();
        cache.insert_with_policy("key1", "value1", minute());

        let debug_str = format!("{:?}", cache);
        assert!(debug_str.contains("TimedCache"));
        assert!(debug_str.contains("entries: 1"));
    }
}
