//! Process-local cache backend for tests and single-node runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use folio_core::{CacheError, FolioResult};
use tokio::sync::RwLock;

use super::key::CacheKey;
use super::traits::{CacheBackend, CacheStats};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// `HashMap` cache with lazy expiry, hit/miss counters and switchable
/// failures for exercising error paths.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    entries: RwLock<HashMap<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    fail_gets: AtomicBool,
    fail_sets: AtomicBool,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `get` (and `ping`) return a backend error.
    pub fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Make `set` return a backend error.
    pub fn set_fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    /// Store a raw value without going through serialization.
    pub async fn insert_raw(&self, key: &CacheKey, value: impl Into<String>) {
        self.entries.write().await.insert(
            key.as_str().to_string(),
            Entry {
                value: value.into(),
                expires_at: Instant::now() + Duration::from_secs(3600),
            },
        );
    }

    /// Whether an unexpired entry exists for `key`.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .read()
            .await
            .get(key.as_str())
            .is_some_and(|e| e.expires_at > Instant::now())
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::SeqCst),
            misses: self.misses.load(Ordering::SeqCst),
            sets: self.sets.load(Ordering::SeqCst),
            entries: self.entries.read().await.len() as u64,
        }
    }

    fn injected(op: &str) -> CacheError {
        CacheError::Backend {
            reason: format!("injected {op} failure"),
        }
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &CacheKey) -> FolioResult<Option<String>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(Self::injected("get").into());
        }

        let mut entries = self.entries.write().await;
        let now = Instant::now();
        match entries.get(key.as_str()) {
            Some(entry) if entry.expires_at > now => {
                self.hits.fetch_add(1, Ordering::SeqCst);
                Ok(Some(entry.value.clone()))
            }
            Some(_) => {
                entries.remove(key.as_str());
                self.misses.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
            None => {
                self.misses.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &CacheKey, value: String, ttl: Duration) -> FolioResult<()> {
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(Self::injected("set").into());
        }

        self.sets.fetch_add(1, Ordering::SeqCst);
        self.entries.write().await.insert(
            key.as_str().to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> FolioResult<()> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(Self::injected("ping").into());
        }
        Ok(())
    }
}
