//! Image bucket on an S3-compatible object store.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use folio_core::{ConfigError, FolioResult, ImageKey, ObjectStoreError};
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info};

use crate::{env_var, parse_env_var, required_env_var};

/// Connection settings for the image bucket (S3 or MinIO).
#[derive(Clone)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: SecretString,
    pub bucket: String,
    pub region: String,
    /// MinIO deployments usually serve plain HTTP.
    pub allow_http: bool,
}

impl fmt::Debug for ObjectStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

impl ObjectStoreConfig {
    /// Load from `FOLIO_S3_*` variables. Endpoint, keys and bucket are
    /// required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: required_env_var("FOLIO_S3_ENDPOINT")?,
            access_key: required_env_var("FOLIO_S3_ACCESS_KEY")?,
            secret_key: SecretString::new(required_env_var("FOLIO_S3_SECRET_KEY")?.into()),
            bucket: required_env_var("FOLIO_S3_BUCKET")?,
            region: env_var("FOLIO_S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            allow_http: parse_env_var("FOLIO_S3_ALLOW_HTTP", true)?,
        })
    }
}

/// A fetched object: its size and a byte stream.
pub struct ImageObject {
    pub key: ImageKey,
    pub size: u64,
    pub stream: BoxStream<'static, Result<Bytes, ObjectStoreError>>,
}

impl fmt::Debug for ImageObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageObject")
            .field("key", &self.key)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl ImageObject {
    /// Drain the stream into one buffer.
    pub async fn into_bytes(self) -> FolioResult<Bytes> {
        let chunks: Vec<Bytes> = self.stream.try_collect().await?;
        Ok(Bytes::from(chunks.concat()))
    }
}

/// Flat namespace of image objects inside one bucket.
#[derive(Clone)]
pub struct ImageBucket {
    inner: Arc<dyn ObjectStore>,
    bucket: String,
}

impl fmt::Debug for ImageBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBucket")
            .field("bucket", &self.bucket)
            .field("store", &self.inner.to_string())
            .finish()
    }
}

impl ImageBucket {
    pub fn new(inner: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            inner,
            bucket: bucket.into(),
        }
    }

    /// Path-style S3 client for the configured endpoint.
    pub fn from_config(config: &ObjectStoreConfig) -> FolioResult<Self> {
        let store = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint)
            .with_access_key_id(&config.access_key)
            .with_secret_access_key(config.secret_key.expose_secret())
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .with_allow_http(config.allow_http)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "FOLIO_S3_ENDPOINT".to_string(),
                value: config.endpoint.clone(),
                reason: e.to_string(),
            })?;

        info!(endpoint = %config.endpoint, bucket = %config.bucket, "Configured image bucket");
        Ok(Self::new(Arc::new(store), config.bucket.clone()))
    }

    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), bucket)
    }

    /// Store `data` under `key`, returning the stored size.
    pub async fn put(&self, key: &ImageKey, data: Bytes) -> FolioResult<u64> {
        let size = data.len() as u64;
        self.inner
            .put(&object_path(key), PutPayload::from(data))
            .await
            .map_err(|e| map_error(key, e))?;

        debug!(bucket = %self.bucket, key = %key, size, "Stored object");
        Ok(size)
    }

    pub async fn get(&self, key: &ImageKey) -> FolioResult<ImageObject> {
        let result = self
            .inner
            .get(&object_path(key))
            .await
            .map_err(|e| map_error(key, e))?;

        let size = result.meta.size as u64;
        let stream_key = key.clone();
        let stream = result
            .into_stream()
            .map_err(move |e| map_error(&stream_key, e))
            .boxed();

        Ok(ImageObject {
            key: key.clone(),
            size,
            stream,
        })
    }

    /// Remove `key`. Deleting an absent object succeeds, as on S3.
    pub async fn delete(&self, key: &ImageKey) -> FolioResult<()> {
        match self.inner.delete(&object_path(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                debug!(bucket = %self.bucket, key = %key, "Deleted object");
                Ok(())
            }
            Err(e) => Err(map_error(key, e).into()),
        }
    }
}

fn object_path(key: &ImageKey) -> Path {
    Path::from(key.as_str())
}

fn map_error(key: &ImageKey, e: object_store::Error) -> ObjectStoreError {
    match e {
        object_store::Error::NotFound { .. } => ObjectStoreError::NotFound {
            key: key.to_string(),
        },
        other => {
            error!(key = %key, error = %other, "Object store request failed");
            ObjectStoreError::Backend {
                reason: other.to_string(),
            }
        }
    }
}
