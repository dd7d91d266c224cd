use async_trait::async_trait;
use contact_search::error::{StoreError, StoreResult};
use contact_search::models::ContactRecord;
use contact_search::repositories::{ContactStore, InMemoryContactStore, PageWindow};
use contact_search::search::ContactQuery;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock contact store for testing.
///
/// Answers queries like [`InMemoryContactStore`], tracks method calls for
/// verification and can be switched into a failing mode.
#[allow(dead_code)]
#[derive(Clone)]
pub struct MockContactStore {
    inner: Arc<InMemoryContactStore>,
    call_counts: Arc<Mutex<HashMap<String, usize>>>,
    windows: Arc<Mutex<Vec<Option<PageWindow>>>>,
    failing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockContactStore {
    /// Create a new empty MockContactStore.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InMemoryContactStore::new()),
            call_counts: Arc::new(Mutex::new(HashMap::new())),
            windows: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a store holding `records`.
    pub fn with_records(records: Vec<ContactRecord>) -> Self {
        let store = Self::new();
        store.add_records(records);
        store
    }

    pub fn add_records(&self, records: Vec<ContactRecord>) {
        for record in records {
            self.inner.insert(record);
        }
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get the number of times a method was called.
    pub fn get_call_count(&self, method: &str) -> usize {
        let counts = self.call_counts.lock().unwrap();
        *counts.get(method).unwrap_or(&0)
    }

    /// Total calls across all methods.
    pub fn total_calls(&self) -> usize {
        self.call_counts.lock().unwrap().values().sum()
    }

    /// Windows passed to `fetch`, in call order.
    pub fn fetch_windows(&self) -> Vec<Option<PageWindow>> {
        self.windows.lock().unwrap().clone()
    }

    /// Reset all call counts.
    pub fn reset_call_counts(&self) {
        self.call_counts.lock().unwrap().clear();
        self.windows.lock().unwrap().clear();
    }

    fn track_call(&self, method: &str) -> StoreResult<()> {
        let mut counts = self.call_counts.lock().unwrap();
        *counts.entry(method.to_string()).or_insert(0) += 1;

        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("mock store offline".to_string()));
        }
        Ok(())
    }
}

impl Default for MockContactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContactStore for MockContactStore {
    async fn count(&self, query: &ContactQuery) -> StoreResult<usize> {
        self.track_call("count")?;
        self.inner.count(query).await
    }

    async fn fetch(
        &self,
        query: &ContactQuery,
        window: Option<PageWindow>,
    ) -> StoreResult<Vec<ContactRecord>> {
        self.windows.lock().unwrap().push(window);
        self.track_call("fetch")?;
        self.inner.fetch(query, window).await
    }
}
