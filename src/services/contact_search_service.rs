//! Contact search service layer.
//!
//! Orchestrates a search: result-cache lookup, query construction, counting,
//! paging, deal-value enrichment, projection and result caching.

use crate::cache::keys::search_result_key;
use crate::cache::{CachePolicy, CacheStore};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{SearchError, SearchOutcome};
use crate::metrics::SearchMetrics;
use crate::models::{ContactDto, ContactRecord, ContactSearchRequest, SearchResult};
use crate::repositories::{ContactStore, PageWindow};
use crate::search::{ContactQuery, PageToken};
use crate::services::deal_value_service::{
    CachedDealValueService, DealValueService, DEAL_VALUE_TTL_SECS,
};
use async_trait::async_trait;
use chrono::Duration;
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Deal values resolved concurrently per search.
const ENRICHMENT_CONCURRENCY: usize = 16;

/// Contact search.
#[async_trait]
pub trait ContactSearchService: Send + Sync {
    /// Run a filtered, sorted, paginated search.
    ///
    /// Only store failures are returned as errors; cache problems degrade to misses.
    async fn search(&self, request: ContactSearchRequest) -> SearchOutcome<SearchResult>;
}

/// Cache lifetimes and paging limits for a [`ContactSearcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Absolute lifetime of a cached result page.
    pub result_ttl_secs: u64,
    /// Idle window after which a cached result page is dropped.
    pub result_sliding_secs: u64,
    /// Lifetime of a memoized deal value.
    pub deal_value_ttl_secs: u64,
    /// Larger page sizes are clamped to this.
    pub max_page_size: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            result_ttl_secs: 300,
            result_sliding_secs: 60,
            deal_value_ttl_secs: DEAL_VALUE_TTL_SECS,
            max_page_size: 1000,
        }
    }
}

impl From<&Config> for SearchSettings {
    fn from(config: &Config) -> Self {
        Self {
            result_ttl_secs: config.result_cache_ttl_secs,
            result_sliding_secs: config.result_cache_sliding_secs,
            deal_value_ttl_secs: config.deal_value_cache_ttl_secs,
            max_page_size: config.max_page_size,
        }
    }
}

impl SearchSettings {
    fn result_policy(&self) -> CachePolicy {
        CachePolicy::sliding(
            Duration::seconds(self.result_ttl_secs as i64),
            Duration::seconds(self.result_sliding_secs as i64),
        )
    }
}

/// Default implementation of [`ContactSearchService`].
///
/// Holds no per-request state; one instance serves concurrent searches.
pub struct ContactSearcher {
    store: Arc<dyn ContactStore>,
    cache: Arc<dyn CacheStore>,
    deal_values: Arc<dyn DealValueService>,
    settings: SearchSettings,
    metrics: SearchMetrics,
}

impl ContactSearcher {
    /// Create a searcher whose deal values are memoized in the same cache.
    ///
    /// # Arguments
    /// * `store` - Contact data source
    /// * `cache` - Result and deal-value cache
    /// * `clock` - Time source for deal-value decay and cache expiry
    /// * `settings` - Cache lifetimes and paging limits
    pub fn new(
        store: Arc<dyn ContactStore>,
        cache: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        settings: SearchSettings,
    ) -> Self {
        let metrics = SearchMetrics::new();
        let deal_values = Arc::new(CachedDealValueService::new(
            cache.clone(),
            clock,
            settings.deal_value_ttl_secs,
            metrics.clone(),
        ));
        Self::with_deal_values(store, cache, deal_values, settings, metrics)
    }

    /// Create a searcher with an explicit deal value service.
    pub fn with_deal_values(
        store: Arc<dyn ContactStore>,
        cache: Arc<dyn CacheStore>,
        deal_values: Arc<dyn DealValueService>,
        settings: SearchSettings,
        metrics: SearchMetrics,
    ) -> Self {
        Self {
            store,
            cache,
            deal_values,
            settings,
            metrics,
        }
    }

    /// Counters shared with the deal value service.
    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    async fn cached_result(&self, key: &str) -> Option<SearchResult> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<SearchResult>(&raw) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable cached search result");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Result cache read failed, querying store");
                self.metrics.record_cache_error();
                None
            }
        }
    }

    async fn cache_result(&self, key: &str, result: &SearchResult) {
        let raw = match serde_json::to_string(result) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize search result for caching");
                return;
            }
        };
        if let Err(e) = self
            .cache
            .set(key, raw, self.settings.result_policy())
            .await
        {
            warn!(error = %e, "Failed to cache search result");
            self.metrics.record_cache_error();
        }
    }

    /// Resolve deal values for `records`, keeping their order.
    async fn enrich(&self, records: Vec<ContactRecord>) -> Vec<(ContactRecord, Decimal)> {
        let deal_values = self.deal_values.clone();
        stream::iter(records)
            .map(move |record| {
                let deal_values = deal_values.clone();
                async move {
                    let value = deal_values.deal_value(&record).await;
                    (record, value)
                }
            })
            .buffered(ENRICHMENT_CONCURRENCY)
            .collect()
            .await
    }

    /// Count, then fetch one page, entirely in the store.
    async fn store_page(
        &self,
        query: &ContactQuery,
        request: &ContactSearchRequest,
    ) -> SearchOutcome<(usize, Vec<(ContactRecord, Decimal)>)> {
        let total_count = self.store.count(query).await?;
        self.metrics.record_store_query();

        let window = PageWindow::new(request.offset(), request.page_size as usize);
        let records = if window.offset >= total_count {
            Vec::new()
        } else {
            let records = self.store.fetch(query, Some(window)).await?;
            self.metrics.record_store_query();
            records
        };

        Ok((total_count, self.enrich(records).await))
    }

    /// Fetch every store-side match, keep those whose deal value exceeds
    /// `threshold`, then count and page the survivors.
    async fn deal_value_page(
        &self,
        query: &ContactQuery,
        request: &ContactSearchRequest,
        threshold: Decimal,
    ) -> SearchOutcome<(usize, Vec<(ContactRecord, Decimal)>)> {
        let candidates = self.store.fetch(query, None).await?;
        self.metrics.record_store_query();

        let matched: Vec<(ContactRecord, Decimal)> = self
            .enrich(candidates)
            .await
            .into_iter()
            .filter(|(_, value)| *value > threshold)
            .collect();
        let total_count = matched.len();

        let page = matched
            .into_iter()
            .skip(request.offset())
            .take(request.page_size as usize)
            .collect();

        Ok((total_count, page))
    }
}

#[async_trait]
impl ContactSearchService for ContactSearcher {
    async fn search(&self, request: ContactSearchRequest) -> SearchOutcome<SearchResult> {
        let started = Instant::now();
        let request = request.normalized(self.settings.max_page_size);
        let key = match search_result_key(&request) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "Failed to build result cache key, bypassing cache");
                None
            }
        };

        if let Some(key) = key.as_deref() {
            if let Some(mut cached) = self.cached_result(key).await {
                cached.elapsed_milliseconds = elapsed_ms(started);
                self.metrics.record_search(started.elapsed(), true);
                debug!(
                    total_count = cached.total_count,
                    page = cached.page,
                    "Serving contact search from cache"
                );
                return Ok(cached);
            }
        }

        let query = ContactQuery::from_request(&request);
        let (total_count, page) = match request.min_deal_value {
            Some(threshold) => self.deal_value_page(&query, &request, threshold).await?,
            None => self.store_page(&query, &request).await?,
        };

        let data: Vec<ContactDto> = page
            .into_iter()
            .map(|(record, value)| project(record, value))
            .collect();

        let next_page_token = PageToken::after(
            request.page,
            request.page_size,
            total_count,
            &request.sort_by,
            request.sort_descending,
        )
        .map(|token| token.encode())
        .transpose()
        .map_err(|e| SearchError::Other(format!("failed to encode page token: {}", e)))?;

        let result = SearchResult {
            total_count,
            page: request.page,
            page_size: request.page_size,
            data,
            elapsed_milliseconds: elapsed_ms(started),
            next_page_token,
        };

        if let Some(key) = key.as_deref() {
            self.cache_result(key, &result).await;
        }
        self.metrics.record_search(started.elapsed(), false);

        info!(
            total_count = result.total_count,
            returned = result.data.len(),
            page = result.page,
            elapsed_ms = result.elapsed_milliseconds,
            "Contact search completed"
        );

        Ok(result)
    }
}

/// Flatten a record and its deal value into the read-model.
pub fn project(record: ContactRecord, deal_value: Decimal) -> ContactDto {
    let ContactRecord {
        contact,
        tags,
        interactions,
        ..
    } = record;

    ContactDto {
        id: contact.id,
        full_name: contact.full_name(),
        email: contact.email,
        company: contact.company,
        city: contact.city,
        last_contact_date: contact.last_contact_date,
        tags,
        interaction_count: interactions.len(),
        deal_value,
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
