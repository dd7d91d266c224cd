//! Test doubles for the store and cache seams.

mod mock_cache_store;
mod mock_contact_store;

#[allow(unused_imports)]
pub use mock_cache_store::MockCacheStore;
#[allow(unused_imports)]
pub use mock_contact_store::MockContactStore;
