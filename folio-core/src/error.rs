//! Error types for Folio operations

use crate::{EntityId, EntityType};
use thiserror::Error;

/// Credential store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: EntityType, id: EntityId },

    #[error("Duplicate {entity_type}: {field} '{value}' already exists")]
    Duplicate {
        entity_type: EntityType,
        field: String,
        value: String,
    },

    #[error("Storage backend failure: {reason}")]
    Backend { reason: String },
}

/// Key-value cache errors. A missing key is not an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend failure: {reason}")]
    Backend { reason: String },

    #[error("Cache entry '{key}' could not be (de)serialized: {reason}")]
    Serialization { key: String, reason: String },
}

/// Object store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ObjectStoreError {
    #[error("Object not found: {key}")]
    NotFound { key: String },

    #[error("Invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Object store failure: {reason}")]
    Backend { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all Folio errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FolioError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] ObjectStoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Folio operations.
pub type FolioResult<T> = Result<T, FolioError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityType::Article,
            id: 42,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("article"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_storage_error_display_duplicate() {
        let err = StorageError::Duplicate {
            entity_type: EntityType::User,
            field: "email".to_string(),
            value: "a@x.com".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("email"));
        assert!(msg.contains("a@x.com"));
    }

    #[test]
    fn test_cache_error_display_serialization() {
        let err = CacheError::Serialization {
            key: "article_1".to_string(),
            reason: "expected value".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("article_1"));
        assert!(msg.contains("expected value"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "FOLIO_CACHE_ITEM_TTL_SECS".to_string(),
            value: "soon".to_string(),
            reason: "must be an integer".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("FOLIO_CACHE_ITEM_TTL_SECS"));
        assert!(msg.contains("soon"));
        assert!(msg.contains("must be an integer"));
    }

    #[test]
    fn test_folio_error_from_variants() {
        let storage = FolioError::from(StorageError::Backend {
            reason: "down".to_string(),
        });
        assert!(matches!(storage, FolioError::Storage(_)));

        let cache = FolioError::from(CacheError::Backend {
            reason: "refused".to_string(),
        });
        assert!(matches!(cache, FolioError::Cache(_)));

        let object = FolioError::from(ObjectStoreError::NotFound {
            key: "a.jpg".to_string(),
        });
        assert!(matches!(object, FolioError::ObjectStore(_)));

        let validation = FolioError::from(ValidationError::RequiredFieldMissing {
            field: "title".to_string(),
        });
        assert!(matches!(validation, FolioError::Validation(_)));

        let config = FolioError::from(ConfigError::MissingRequired {
            field: "FOLIO_S3_BUCKET".to_string(),
        });
        assert!(matches!(config, FolioError::Config(_)));
    }
}
