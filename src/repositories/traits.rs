use crate::error::StoreResult;
use crate::models::ContactRecord;
use crate::search::ContactQuery;
use async_trait::async_trait;

/// A slice of an ordered result set: skip `offset` rows, return at most `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

impl PageWindow {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

/// Read access to contacts and their related rows.
///
/// Provides abstraction over contact storage, enabling different implementations
/// (relational database, in-memory, mock). Implementations must order results by
/// `query.sort` with ties broken by ascending contact id.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Count contacts matching the query's filter.
    async fn count(&self, query: &ContactQuery) -> StoreResult<usize>;

    /// Fetch matching contacts in query order, with tags, interactions and deals
    /// loaded. `None` returns every match.
    async fn fetch(
        &self,
        query: &ContactQuery,
        window: Option<PageWindow>,
    ) -> StoreResult<Vec<ContactRecord>>;
}
