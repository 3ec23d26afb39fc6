//! Look-aside cache in front of the credential store.
//!
//! Reads consult the cache first and populate it on a miss. Writes never
//! touch the cache, so an entry can outlive the record it was copied from
//! until its TTL elapses. Missing records are never cached.

pub mod cached_store;
pub mod key;
pub mod memory_backend;
pub mod read;
pub mod read_through;
pub mod redis_backend;
pub mod traits;

pub use cached_store::{CachedReader, CachedStore};
pub use key::CacheKey;
pub use memory_backend::InMemoryCacheBackend;
pub use read::{CacheRead, ReadSource};
pub use read_through::{CacheConfig, ReadThroughCache};
pub use redis_backend::{RedisCacheBackend, RedisConfig};
pub use traits::{CacheBackend, CacheStats};
