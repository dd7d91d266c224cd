//! Contact Search - filtered, sorted and paginated search over CRM contacts.
//!
//! Each contact returned carries a derived deal value. Deal values and whole
//! result pages are cached, and cache failures only ever cost performance.
//!
//! # Architecture
//!
//! - **models**: Contacts, their tags/interactions/deals, request and result shapes
//! - **error**: Custom error types for precise error handling
//! - **config**: Configuration management from environment variables
//! - **clock**: Injectable time source
//! - **search**: Query description, deal-value formula and page tokens
//! - **repositories**: Contact stores (naive in-memory and SQLite)
//! - **cache**: TTL cache and the cache store seam
//! - **services**: Deal value memoization and the search orchestrator
//! - **metrics**: Counters for cache effectiveness and store traffic

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod repositories;
pub mod search;
pub mod services;

pub use cache::{CachePolicy, CacheStore, InMemoryCacheStore, NullCacheStore, TimedCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, ConfigError, SearchError, StoreError};
pub use metrics::{MetricsSummary, SearchMetrics};
pub use models::{
    Contact, ContactDto, ContactId, ContactRecord, ContactSearchRequest, Deal, DealStage,
    Interaction, InteractionType, RawSearchParams, SearchResult, Tag,
};
pub use repositories::{ContactStore, InMemoryContactStore, PageWindow, SqliteContactStore};
pub use search::{compute_deal_value, ContactQuery, PageToken};
pub use services::{
    CachedDealValueService, ContactSearchService, ContactSearcher, DealValueService,
    SearchSettings,
};
