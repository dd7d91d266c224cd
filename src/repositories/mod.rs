//! Contact storage.
//!
//! Two implementations of [`ContactStore`]: a naive in-memory store that filters
//! and sorts in process, and a SQLite store that pushes both into SQL.

mod in_memory_contact_store;
mod sqlite_contact_store;
mod traits;

pub use in_memory_contact_store::InMemoryContactStore;
pub use sqlite_contact_store::SqliteContactStore;
pub use traits::{ContactStore, PageWindow};
