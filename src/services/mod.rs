//! Application service layer.
//!
//! Services hold the search workflow and sit between callers and the
//! [`ContactStore`](crate::repositories::ContactStore) and
//! [`CacheStore`](crate::cache::CacheStore) seams.

mod contact_search_service;
mod deal_value_service;

pub use contact_search_service::{project, ContactSearchService, ContactSearcher, SearchSettings};
pub use deal_value_service::{CachedDealValueService, DealValueService, DEAL_VALUE_TTL_SECS};
