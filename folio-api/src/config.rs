//! API Configuration Module
//!
//! CORS, listen address, upload limits and environment detection. Loaded
//! from environment variables with development-friendly defaults.

use std::net::SocketAddr;

use crate::error::{ApiError, ApiResult};

/// Default cap on request bodies, which bounds image uploads.
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// API configuration for CORS and production hardening.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests. Browsers need this to
    /// send the session cookie cross-origin.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Request body limit in bytes.
    pub max_body_bytes: usize,

    /// Deployment environment name.
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `FOLIO_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `FOLIO_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `FOLIO_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `FOLIO_MAX_BODY_BYTES`: Request body limit (default: 32 MiB)
    /// - `FOLIO_ENVIRONMENT`: `production` enables startup validation
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = std::env::var("FOLIO_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("FOLIO_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(defaults.cors_allow_credentials);

        let cors_max_age_secs = std::env::var("FOLIO_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let max_body_bytes = std::env::var("FOLIO_MAX_BODY_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_body_bytes);

        let environment = std::env::var("FOLIO_ENVIRONMENT").unwrap_or(defaults.environment);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            max_body_bytes,
            environment,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    /// Reject settings that are only acceptable in development.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        if self.cors_origins.is_empty() {
            return Err(ApiError::validation_failed(
                "CORS origins not configured for production. Set FOLIO_CORS_ORIGINS.",
            ));
        }
        Ok(())
    }
}

/// Resolve the listen address.
///
/// `FOLIO_BIND_ADDR` takes a full `host:port`. Without it the server binds
/// `0.0.0.0` on `PORT` (default 3000).
pub fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    if let Ok(addr) = std::env::var("FOLIO_BIND_ADDR") {
        return addr.trim().parse::<SocketAddr>().map_err(|e| {
            ApiError::validation_failed(format!("Invalid bind address {}: {}", addr, e))
        });
    }

    let port_str = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let port = port_str
        .trim()
        .parse::<u16>()
        .map_err(|_| ApiError::validation_failed(format!("Invalid port value: {}", port_str)))?;

    Ok(SocketAddr::from(([0, 0, 0, 0], port)))
}
