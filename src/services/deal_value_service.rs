//! Deal value service layer.
//!
//! Memoizes [`compute_deal_value`] per contact id in the cache.

use crate::cache::keys::deal_value_key;
use crate::cache::{CachePolicy, CacheStore};
use crate::clock::Clock;
use crate::metrics::SearchMetrics;
use crate::models::ContactRecord;
use crate::search::compute_deal_value;
use async_trait::async_trait;
use chrono::Duration;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default lifetime of a memoized deal value.
pub const DEAL_VALUE_TTL_SECS: u64 = 3600;

/// Resolves a contact's deal value.
#[async_trait]
pub trait DealValueService: Send + Sync {
    /// The deal value for `record` as of now. Never fails.
    async fn deal_value(&self, record: &ContactRecord) -> Decimal;
}

/// Cache-or-compute deal values.
///
/// A cached value short-circuits the formula entirely. On a miss the value is
/// computed against the injected clock and written back with an absolute TTL.
/// Concurrent misses for the same contact each compute and write; the formula is
/// idempotent so the last write wins harmlessly.
pub struct CachedDealValueService {
    cache: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    metrics: SearchMetrics,
}

impl CachedDealValueService {
    /// Create a new deal value service.
    ///
    /// # Arguments
    /// * `cache` - Where memoized values live
    /// * `clock` - Time source for decay
    /// * `ttl_secs` - Lifetime of a memoized value in seconds
    /// * `metrics` - Shared counters
    pub fn new(
        cache: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        ttl_secs: u64,
        metrics: SearchMetrics,
    ) -> Self {
        Self {
            cache,
            clock,
            ttl: Duration::seconds(ttl_secs as i64),
            metrics,
        }
    }

    async fn cached(&self, key: &str) -> Option<Decimal> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match Decimal::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarding unreadable cached deal value");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Deal value cache read failed, computing instead");
                self.metrics.record_cache_error();
                None
            }
        }
    }
}

#[async_trait]
impl DealValueService for CachedDealValueService {
    async fn deal_value(&self, record: &ContactRecord) -> Decimal {
        let key = deal_value_key(record.contact.id);

        if let Some(value) = self.cached(&key).await {
            self.metrics.record_deal_value(true);
            return value;
        }

        let value = compute_deal_value(
            &record.contact,
            &record.interactions,
            &record.deals,
            self.clock.now(),
        );
        self.metrics.record_deal_value(false);
        debug!(contact_id = record.contact.id, value = %value, "Computed deal value");

        if let Err(e) = self
            .cache
            .set(&key, value.to_string(), CachePolicy::absolute(self.ttl))
            .await
        {
            warn!(key = %key, error = %e, "Failed to cache deal value");
            self.metrics.record_cache_error();
        }

        value
    }
}
