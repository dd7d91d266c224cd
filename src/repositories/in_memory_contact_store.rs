use crate::error::{StoreError, StoreResult};
use crate::models::ContactRecord;
use crate::repositories::traits::{ContactStore, PageWindow};
use crate::search::ContactQuery;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Naive contact store that keeps every record in memory.
///
/// Each query walks the full collection: filter, sort, then skip/take. Useful for
/// tests and as the baseline the SQLite store is benchmarked against.
#[derive(Clone, Default)]
pub struct InMemoryContactStore {
    records: Arc<RwLock<Vec<ContactRecord>>>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records`.
    pub fn with_records(records: Vec<ContactRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Add a record, replacing any existing record with the same contact id.
    pub fn insert(&self, record: ContactRecord) {
        if let Ok(mut records) = self.records.write() {
            records.retain(|r| r.contact.id != record.contact.id);
            records.push(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> StoreResult<Vec<ContactRecord>> {
        self.records
            .read()
            .map(|records| records.clone())
            .map_err(|_| StoreError::Unavailable("record lock poisoned".to_string()))
    }
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn count(&self, query: &ContactQuery) -> StoreResult<usize> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("record lock poisoned".to_string()))?;
        Ok(records.iter().filter(|r| query.filter.matches(r)).count())
    }

    async fn fetch(
        &self,
        query: &ContactQuery,
        window: Option<PageWindow>,
    ) -> StoreResult<Vec<ContactRecord>> {
        let matched = query.apply(self.snapshot()?);

        Ok(match window {
            Some(w) => matched.into_iter().skip(w.offset).take(w.limit).collect(),
            None => matched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contact, ContactSearchRequest};
    use chrono::{TimeZone, Utc};

    fn record(id: i64, city: &str) -> ContactRecord {
        let when = Utc.with_ymd_and_hms(2024, 1, id as u32, 0, 0, 0).unwrap();
        let mut contact = Contact::new(id, "First", format!("Last{}", id), when);
        contact.city = city.to_string();
        ContactRecord::new(contact)
    }

    #[tokio::test]
    async fn test_count_and_fetch_respect_filter_and_window() {
        let store = InMemoryContactStore::with_records(vec![
            record(1, "Oslo"),
            record(2, "Oslo"),
            record(3, "Bergen"),
            record(4, "Oslo"),
        ]);
        let query = ContactQuery::from_request(&ContactSearchRequest {
            city: Some("Oslo".to_string()),
            ..Default::default()
        });

        assert_eq!(store.count(&query).await.unwrap(), 3);

        let page = store.fetch(&query, Some(PageWindow::new(1, 1))).await.unwrap();
        assert_eq!(page.len(), 1);
        // Newest first: 4, 2, 1
        assert_eq!(page[0].contact.id, 2);

        let all = store.fetch(&query, None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_insert_replaces_same_id() {
        let store = InMemoryContactStore::new();
        store.insert(record(1, "Oslo"));
        store.insert(record(1, "Bergen"));

        assert_eq!(store.len(), 1);
        let all = store
            .fetch(&ContactQuery::from_request(&ContactSearchRequest::default()), None)
            .await
            .unwrap();
        assert_eq!(all[0].contact.city, "Bergen");
    }
}
