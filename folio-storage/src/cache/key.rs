//! Deterministic cache keys.

use folio_core::{Entity, EntityId};
use std::fmt;

/// A cache key derived from an entity kind.
///
/// Collections use `all_{kind}`; single items use `{kind}_{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn collection<T: Entity>() -> Self {
        CacheKey(format!("all_{}", T::ENTITY_TYPE.as_str()))
    }

    pub fn item<T: Entity>(id: EntityId) -> Self {
        CacheKey(format!("{}_{}", T::ENTITY_TYPE.as_str(), id))
    }

    /// Arbitrary key, for backends and tests that address raw entries.
    pub fn raw(key: impl Into<String>) -> Self {
        CacheKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
