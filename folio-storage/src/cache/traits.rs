//! Cache backend trait.

use std::time::Duration;

use async_trait::async_trait;
use folio_core::FolioResult;

use super::key::CacheKey;

/// String-valued key-value cache with per-key expiry.
///
/// Values are opaque to the backend; the read-through layer owns
/// serialization. A missing or expired key is `Ok(None)`, never an error.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &CacheKey) -> FolioResult<Option<String>>;

    async fn set(&self, key: &CacheKey, value: String, ttl: Duration) -> FolioResult<()>;

    /// Round-trip to the backend, for readiness probes.
    async fn ping(&self) -> FolioResult<()>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    /// Entries currently stored, expired ones included until touched.
    pub entries: u64,
}

impl CacheStats {
    /// Hit ratio in `[0, 1]`; zero when nothing was read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
