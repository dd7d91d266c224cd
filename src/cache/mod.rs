//! Caching for contact search.
//!
//! - [`TimedCache`]: generic in-process cache with TTL and sliding expiration
//! - [`CacheStore`]: the string key-value interface the services talk to
//! - [`keys`]: deterministic cache key construction

pub mod keys;
pub mod store;
pub mod timed_cache;

pub use store::{CacheStore, InMemoryCacheStore, NullCacheStore};
pub use timed_cache::{CachePolicy, TimedCache};
