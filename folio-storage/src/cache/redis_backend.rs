//! Redis cache backend.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use folio_core::{CacheError, ConfigError, FolioResult};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ConnectionInfo, IntoConnectionInfo};
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info};

use super::key::CacheKey;
use super::traits::CacheBackend;
use crate::env_var;

/// Connection settings for the Redis cache.
#[derive(Clone)]
pub struct RedisConfig {
    /// `host:port` or a full `redis://` / `rediss://` URL.
    pub addr: String,
    pub password: Option<SecretString>,
}

impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("addr", &self.addr)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".to_string(),
            password: None,
        }
    }
}

impl RedisConfig {
    /// Load from `FOLIO_REDIS_ADDR` and `FOLIO_REDIS_PASSWORD`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            addr: env_var("FOLIO_REDIS_ADDR").unwrap_or(defaults.addr),
            password: env_var("FOLIO_REDIS_PASSWORD").map(|p| SecretString::new(p.into())),
        }
    }

    pub fn connection_info(&self) -> Result<ConnectionInfo, ConfigError> {
        let url = if self.addr.starts_with("redis://") || self.addr.starts_with("rediss://") {
            self.addr.clone()
        } else {
            format!("redis://{}", self.addr)
        };

        let mut info = url
            .as_str()
            .into_connection_info()
            .map_err(|e| ConfigError::InvalidValue {
                field: "FOLIO_REDIS_ADDR".to_string(),
                value: self.addr.clone(),
                reason: e.to_string(),
            })?;

        if let Some(password) = &self.password {
            info.redis.password = Some(password.expose_secret().to_string());
        }
        Ok(info)
    }
}

/// [`CacheBackend`] over a multiplexed, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisCacheBackend {
    conn: ConnectionManager,
}

impl RedisCacheBackend {
    pub async fn connect(config: &RedisConfig) -> FolioResult<Self> {
        let info = config.connection_info()?;
        let client = redis::Client::open(info).map_err(backend_error)?;
        let conn = ConnectionManager::new(client).await.map_err(|e| {
            error!(addr = %config.addr, error = %e, "Failed to connect to Redis");
            backend_error(e)
        })?;

        info!(addr = %config.addr, "Connected to Redis cache");
        Ok(Self { conn })
    }
}

fn backend_error(e: redis::RedisError) -> CacheError {
    CacheError::Backend {
        reason: e.to_string(),
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &CacheKey) -> FolioResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key.as_str()).await.map_err(backend_error)?;
        Ok(value)
    }

    async fn set(&self, key: &CacheKey, value: String, ttl: Duration) -> FolioResult<()> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key.as_str(), value, seconds)
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn ping(&self) -> FolioResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}
