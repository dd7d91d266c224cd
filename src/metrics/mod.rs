//! Basic metrics instrumentation for tracking search performance.
//!
//! Provides counters for cache effectiveness, deal-value computation and store
//! round trips, plus total search time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Metrics collector for the search services.
///
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct SearchMetrics {
    /// Total number of searches served
    searches_total: Arc<AtomicU64>,

    /// Searches answered from the result cache
    result_cache_hits: Arc<AtomicU64>,

    /// Searches that had to query the store
    result_cache_misses: Arc<AtomicU64>,

    /// Deal values found in the cache
    deal_value_cache_hits: Arc<AtomicU64>,

    /// Deal values that had to be computed
    deal_value_cache_misses: Arc<AtomicU64>,

    /// Cache reads or writes that failed and were ignored
    cache_errors_total: Arc<AtomicU64>,

    /// Count and fetch queries sent to the store
    store_queries_total: Arc<AtomicU64>,

    /// Total duration of all searches in microseconds
    search_duration_total_us: Arc<AtomicU64>,
}

impl SearchMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished search.
    pub fn record_search(&self, duration: Duration, from_cache: bool) {
        self.searches_total.fetch_add(1, Ordering::Relaxed);
        self.search_duration_total_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        if from_cache {
            self.result_cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.result_cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a deal-value lookup.
    pub fn record_deal_value(&self, from_cache: bool) {
        if from_cache {
            self.deal_value_cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.deal_value_cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a cache failure that was treated as a miss.
    pub fn record_cache_error(&self) {
        self.cache_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a query sent to the store.
    pub fn record_store_query(&self) {
        self.store_queries_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn searches_total(&self) -> u64 {
        self.searches_total.load(Ordering::Relaxed)
    }

    pub fn result_cache_hits(&self) -> u64 {
        self.result_cache_hits.load(Ordering::Relaxed)
    }

    pub fn result_cache_misses(&self) -> u64 {
        self.result_cache_misses.load(Ordering::Relaxed)
    }

    pub fn deal_value_cache_hits(&self) -> u64 {
        self.deal_value_cache_hits.load(Ordering::Relaxed)
    }

    /// Equals the number of deal values computed.
    pub fn deal_value_cache_misses(&self) -> u64 {
        self.deal_value_cache_misses.load(Ordering::Relaxed)
    }

    pub fn cache_errors_total(&self) -> u64 {
        self.cache_errors_total.load(Ordering::Relaxed)
    }

    pub fn store_queries_total(&self) -> u64 {
        self.store_queries_total.load(Ordering::Relaxed)
    }

    /// Average search duration in milliseconds.
    pub fn search_duration_avg_ms(&self) -> f64 {
        let total = self.search_duration_total_us.load(Ordering::Relaxed);
        let count = self.searches_total();
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64 / 1000.0
        }
    }

    /// Result cache hit rate (0.0 to 1.0).
    pub fn result_cache_hit_rate(&self) -> f64 {
        let total = self.searches_total();
        if total == 0 {
            0.0
        } else {
            self.result_cache_hits() as f64 / total as f64
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        for counter in [
            &self.searches_total,
            &self.result_cache_hits,
            &self.result_cache_misses,
            &self.deal_value_cache_hits,
            &self.deal_value_cache_misses,
            &self.cache_errors_total,
            &self.store_queries_total,
            &self.search_duration_total_us,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Get a summary of all metrics.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            searches_total: self.searches_total(),
            result_cache_hits: self.result_cache_hits(),
            result_cache_misses: self.result_cache_misses(),
            deal_value_cache_hits: self.deal_value_cache_hits(),
            deal_value_cache_misses: self.deal_value_cache_misses(),
            cache_errors_total: self.cache_errors_total(),
            store_queries_total: self.store_queries_total(),
            search_duration_avg_ms: self.search_duration_avg_ms(),
        }
    }
}

/// A snapshot of metrics values.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub searches_total: u64,
    pub result_cache_hits: u64,
    pub result_cache_misses: u64,
    pub deal_value_cache_hits: u64,
    pub deal_value_cache_misses: u64,
    pub cache_errors_total: u64,
    pub store_queries_total: u64,
    pub search_duration_avg_ms: f64,
}
