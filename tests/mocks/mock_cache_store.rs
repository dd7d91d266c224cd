use async_trait::async_trait;
use contact_search::cache::{CachePolicy, CacheStore};
use contact_search::error::{CacheError, CacheResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock cache store for testing.
///
/// Entries never expire. Every `set` is recorded with its policy, and the store
/// can be switched into a mode where both reads and writes fail.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct MockCacheStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    writes: Arc<Mutex<Vec<(String, CachePolicy)>>>,
    call_counts: Arc<Mutex<HashMap<String, usize>>>,
    failing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails.
    pub fn failing() -> Self {
        let store = Self::new();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Seed an entry directly, bypassing failure mode and tracking.
    pub fn put(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    /// Keys and policies passed to `set`, in call order.
    pub fn writes(&self) -> Vec<(String, CachePolicy)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn get_call_count(&self, method: &str) -> usize {
        let counts = self.call_counts.lock().unwrap();
        *counts.get(method).unwrap_or(&0)
    }

    fn track_call(&self, method: &str) -> CacheResult<()> {
        let mut counts = self.call_counts.lock().unwrap();
        *counts.entry(method.to_string()).or_insert(0) += 1;

        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("mock cache offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MockCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.track_call("get")?;
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: String, policy: CachePolicy) -> CacheResult<()> {
        self.track_call("set")?;
        self.writes.lock().unwrap().push((key.to_string(), policy));
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}
