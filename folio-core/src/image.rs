//! Object names for uploaded images.

use crate::ObjectStoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Extension every uploaded image is stored under, regardless of the
/// client's original filename.
pub const IMAGE_EXTENSION: &str = "jpg";

const MAX_KEY_LEN: usize = 255;

/// Name of an object in the image bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageKey(String);

impl ImageKey {
    /// Fresh `{uuid}.jpg` key for a new upload.
    pub fn generate() -> Self {
        ImageKey(format!("{}.{}", Uuid::new_v4(), IMAGE_EXTENSION))
    }

    /// Validate a client-supplied key. Keys are flat names: no separators,
    /// no parent references.
    pub fn parse(raw: &str) -> Result<Self, ObjectStoreError> {
        let invalid = |reason: &str| ObjectStoreError::InvalidKey {
            key: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("key is empty"));
        }
        if raw.len() > MAX_KEY_LEN {
            return Err(invalid("key is longer than 255 bytes"));
        }
        if raw.contains('/') || raw.contains('\\') {
            return Err(invalid("key must not contain path separators"));
        }
        if raw.contains("..") {
            return Err(invalid("key must not contain '..'"));
        }
        if raw.chars().any(char::is_control) {
            return Err(invalid("key must not contain control characters"));
        }
        Ok(ImageKey(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ImageKey {
    type Err = ObjectStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageKey::parse(s)
    }
}

impl TryFrom<String> for ImageKey {
    type Error = ObjectStoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ImageKey::parse(&value)
    }
}

impl From<ImageKey> for String {
    fn from(key: ImageKey) -> Self {
        key.0
    }
}
