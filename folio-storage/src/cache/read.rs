//! Cache read results tagged with where they came from.

use chrono::{DateTime, Utc};

/// Where a read-through value was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadSource {
    Cache,
    Store,
}

impl ReadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadSource::Cache => "cache",
            ReadSource::Store => "store",
        }
    }
}

/// Result of a read-through lookup.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    source: ReadSource,
    read_at: DateTime<Utc>,
}

impl<T> CacheRead<T> {
    pub fn from_cache(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Cache,
            read_at: Utc::now(),
        }
    }

    pub fn from_store(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Store,
            read_at: Utc::now(),
        }
    }

    pub fn source(&self) -> ReadSource {
        self.source
    }

    pub fn was_cache_hit(&self) -> bool {
        self.source == ReadSource::Cache
    }

    pub fn read_at(&self) -> DateTime<Utc> {
        self.read_at
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Split into the value and its source.
    pub fn into_parts(self) -> (T, ReadSource) {
        (self.value, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_tagging() {
        let hit = CacheRead::from_cache(1);
        let miss = CacheRead::from_store(2);
        assert!(hit.was_cache_hit());
        assert!(!miss.was_cache_hit());
        assert_eq!(hit.source().as_str(), "cache");
        assert_eq!(miss.into_parts(), (2, ReadSource::Store));
    }
}
