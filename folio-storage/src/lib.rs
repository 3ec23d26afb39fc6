//! Folio Storage - Store Traits, Read-Through Cache and Object Store
//!
//! Defines the persistence seams the HTTP layer is written against. The
//! Postgres implementations live in folio-api; this crate carries the
//! traits, the cache orchestration, the Redis and S3 adapters, and
//! in-memory doubles for tests.

pub mod cache;
pub mod memory;
pub mod objects;
pub mod store;

pub use cache::{
    CacheBackend, CacheConfig, CacheKey, CacheRead, CacheStats, CachedReader, CachedStore,
    InMemoryCacheBackend, ReadSource, ReadThroughCache, RedisCacheBackend, RedisConfig,
};
pub use memory::InMemoryStore;
pub use objects::{ImageBucket, ImageObject, ObjectStoreConfig};
pub use store::{Store, UserStore};

use folio_core::ConfigError;

/// Read an optional environment variable, treating blank values as unset.
pub(crate) fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn required_env_var(name: &str) -> Result<String, ConfigError> {
    env_var(name).ok_or_else(|| ConfigError::MissingRequired {
        field: name.to_string(),
    })
}

/// Parse an optional environment variable, falling back to `default`.
pub(crate) fn parse_env_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(name) {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            field: name.to_string(),
            value: raw,
            reason: e.to_string(),
        }),
    }
}
