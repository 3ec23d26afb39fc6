//! Read-through cache orchestration.
//!
//! Each read computes a key, asks the backend, and on a miss reads the store
//! and writes the serialized result back with a TTL. Backend failures and
//! undecodable entries surface as errors instead of falling back to the
//! store.

use std::sync::Arc;
use std::time::Duration;

use folio_core::{CacheError, ConfigError, Entity, EntityId, FolioResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::key::CacheKey;
use super::read::CacheRead;
use super::traits::CacheBackend;
use crate::parse_env_var;
use crate::store::Store;

/// TTLs for cached reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL for single-item entries.
    pub item_ttl: Duration,
    /// TTL for collection entries.
    pub collection_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            item_ttl: Duration::from_secs(60),
            collection_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item_ttl(mut self, ttl: Duration) -> Self {
        self.item_ttl = ttl;
        self
    }

    pub fn with_collection_ttl(mut self, ttl: Duration) -> Self {
        self.collection_ttl = ttl;
        self
    }

    /// Load TTLs from `FOLIO_CACHE_ITEM_TTL_SECS` and
    /// `FOLIO_CACHE_COLLECTION_TTL_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let item = parse_env_var("FOLIO_CACHE_ITEM_TTL_SECS", defaults.item_ttl.as_secs())?;
        let collection = parse_env_var(
            "FOLIO_CACHE_COLLECTION_TTL_SECS",
            defaults.collection_ttl.as_secs(),
        )?;

        for (field, secs) in [
            ("FOLIO_CACHE_ITEM_TTL_SECS", item),
            ("FOLIO_CACHE_COLLECTION_TTL_SECS", collection),
        ] {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: secs.to_string(),
                    reason: "TTL must be at least one second".to_string(),
                });
            }
        }

        Ok(Self {
            item_ttl: Duration::from_secs(item),
            collection_ttl: Duration::from_secs(collection),
        })
    }
}

/// Look-aside cache over any [`CacheBackend`].
///
/// No negative caching: a missing item is returned as `None` and nothing is
/// written. No invalidation: nothing here is called on writes.
#[derive(Clone)]
pub struct ReadThroughCache {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
}

impl ReadThroughCache {
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    pub fn with_defaults(backend: Arc<dyn CacheBackend>) -> Self {
        Self::new(backend, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Single item by id, served from the `{kind}_{id}` entry when present.
    pub async fn get_item<T, S>(&self, id: EntityId, store: &S) -> FolioResult<Option<CacheRead<T>>>
    where
        T: Entity,
        S: Store<T> + ?Sized,
    {
        let key = CacheKey::item::<T>(id);

        if let Some(value) = self.lookup::<T>(&key).await? {
            debug!(key = %key, "cache hit");
            return Ok(Some(CacheRead::from_cache(value)));
        }

        debug!(key = %key, "cache miss");
        let Some(value) = store.find_by_id(id).await? else {
            return Ok(None);
        };

        self.populate(&key, &value, self.config.item_ttl).await?;
        Ok(Some(CacheRead::from_store(value)))
    }

    /// Every live record, served from the `all_{kind}` entry when present.
    pub async fn get_collection<T, S>(&self, store: &S) -> FolioResult<CacheRead<Vec<T>>>
    where
        T: Entity,
        S: Store<T> + ?Sized,
    {
        let key = CacheKey::collection::<T>();

        if let Some(values) = self.lookup::<Vec<T>>(&key).await? {
            debug!(key = %key, count = values.len(), "cache hit");
            return Ok(CacheRead::from_cache(values));
        }

        debug!(key = %key, "cache miss");
        let values = store.list().await?;
        self.populate(&key, &values, self.config.collection_ttl)
            .await?;
        Ok(CacheRead::from_store(values))
    }

    async fn lookup<V: DeserializeOwned>(&self, key: &CacheKey) -> FolioResult<Option<V>> {
        let Some(raw) = self.backend.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = %key, error = %e, "undecodable cache entry");
                Err(CacheError::Serialization {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
                .into())
            }
        }
    }

    async fn populate<V: Serialize>(
        &self,
        key: &CacheKey,
        value: &V,
        ttl: Duration,
    ) -> FolioResult<()> {
        let encoded = serde_json::to_string(value).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.backend.set(key, encoded, ttl).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
