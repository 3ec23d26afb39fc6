//! Authentication Module
//!
//! Session credentials are HMAC-signed JWTs whose `sub` claim is the user
//! id. Tokens are issued at login, carried in the `Authorization` cookie,
//! and verified statelessly against the server secret on every protected
//! request.

use crate::error::{ApiError, ApiResult};
use folio_core::{ConfigError, EntityId, FolioError};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

/// Thirty days.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 30 * 24 * 60 * 60;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// Cookie carrying the session token.
pub const DEFAULT_COOKIE_NAME: &str = "Authorization";

// ============================================================================
// CLOCK ABSTRACTION (FOR DETERMINISTIC TESTS)
// ============================================================================

/// Source of "now" for token issue and expiry checks.
pub trait JwtClock: Send + Sync {
    /// Current Unix time in seconds.
    fn now_epoch_secs(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}


// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

/// HMAC signing secret. `Debug` never prints the value.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    pub fn new(secret: String) -> Result<Self, FolioError> {
        if secret.is_empty() {
            return Err(FolioError::Config(ConfigError::MissingRequired {
                field: "jwt_secret".to_string(),
            }));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Token issue and verification settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: JwtSecret,

    /// Must be one of HS256, HS384, HS512.
    pub jwt_algorithm: Algorithm,

    pub jwt_expiration_secs: i64,

    /// Leeway applied to the expiry check.
    pub jwt_clock_skew_secs: i64,

    pub cookie_name: String,

    /// Set the `Secure` attribute on the session cookie.
    pub cookie_secure: bool,

    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: build_jwt_secret(INSECURE_DEFAULT_SECRET.to_string()),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: DEFAULT_TOKEN_LIFETIME_SECS,
            jwt_clock_skew_secs: 0,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: false,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Load from environment variables:
    /// - `FOLIO_JWT_SECRET`
    /// - `FOLIO_JWT_EXPIRATION_SECS` (default 30 days, at most one year)
    /// - `FOLIO_JWT_CLOCK_SKEW_SECS` (default 0)
    /// - `FOLIO_COOKIE_SECURE` (default false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let secret_str = std::env::var("FOLIO_JWT_SECRET")
            .unwrap_or_else(|_| INSECURE_DEFAULT_SECRET.to_string());

        let jwt_expiration_secs = match std::env::var("FOLIO_JWT_EXPIRATION_SECS") {
            Ok(raw) if !raw.trim().is_empty() => parse_token_lifetime(raw.trim())?,
            _ => defaults.jwt_expiration_secs,
        };

        Ok(Self {
            jwt_secret: build_jwt_secret(secret_str),
            jwt_expiration_secs,
            jwt_clock_skew_secs: std::env::var("FOLIO_JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &i64| *secs >= 0)
                .unwrap_or(defaults.jwt_clock_skew_secs),
            cookie_secure: std::env::var("FOLIO_COOKIE_SECURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cookie_secure),
            ..defaults
        })
    }

    /// Config with an explicit secret, for tests and embedding.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: build_jwt_secret(secret.into()),
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn JwtClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Refuse to run in production with the default or a short secret.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        let environment = std::env::var("FOLIO_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();
        let is_production = environment == "production" || environment == "prod";

        if !is_hmac(self.jwt_algorithm) {
            return Err(ApiError::internal_error(format!(
                "JWT algorithm {:?} is not an HMAC algorithm",
                self.jwt_algorithm
            )));
        }

        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::internal_error(format!(
                    "Cannot start server in production with insecure JWT secret. \
                     Set FOLIO_JWT_SECRET to a secure value. FOLIO_ENVIRONMENT={}",
                    environment
                )));
            }
            tracing::warn!(
                "Using insecure default JWT secret. Set FOLIO_JWT_SECRET before deploying."
            );
        } else if self.jwt_secret.len() < 32 {
            if is_production {
                return Err(ApiError::internal_error(format!(
                    "JWT secret is too short for production use ({} chars). \
                     It must be at least 32 characters long.",
                    self.jwt_secret.len()
                )));
            }
            tracing::warn!(
                chars = self.jwt_secret.len(),
                "JWT secret is short; use at least 32 characters in production"
            );
        }

        Ok(())
    }
}

/// Token lifetime in seconds, within `1..=MAX_TOKEN_LIFETIME_SECS`.
fn parse_token_lifetime(raw: &str) -> Result<i64, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        field: "FOLIO_JWT_EXPIRATION_SECS".to_string(),
        value: raw.to_string(),
        reason,
    };

    let secs: i64 = raw.parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
    if !(1..=MAX_TOKEN_LIFETIME_SECS).contains(&secs) {
        return Err(invalid(format!(
            "must be between 1 and {} seconds",
            MAX_TOKEN_LIFETIME_SECS
        )));
    }
    Ok(secs)
}

fn build_jwt_secret(secret_str: String) -> JwtSecret {
    let normalized = if secret_str.trim().is_empty() {
        INSECURE_DEFAULT_SECRET.to_string()
    } else {
        secret_str
    };

    match JwtSecret::new(normalized) {
        Ok(secret) => secret,
        Err(_) => JwtSecret(SecretString::new(INSECURE_DEFAULT_SECRET.into())),
    }
}

fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string.
    pub sub: String,

    pub iat: i64,

    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: EntityId, expiration_secs: i64, clock: &dyn JwtClock) -> ApiResult<Self> {
        let now = clock.now_epoch_secs();
        let exp = now.checked_add(expiration_secs).ok_or_else(|| {
            ApiError::internal_error("Token expiry is out of range")
        })?;
        Ok(Self {
            sub: user_id.to_string(),
            iat: now,
            exp,
        })
    }

    /// The subject as a user id, if it is one.
    pub fn user_id(&self) -> Option<EntityId> {
        self.sub.parse().ok()
    }
}

// ============================================================================
// TOKEN FUNCTIONS
// ============================================================================

/// Verify signature, algorithm family and expiry.
///
/// Every failure is the same generic unauthorized error; the cause is only
/// logged.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let header = decode_header(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected malformed token");
        ApiError::unauthorized()
    })?;

    if !is_hmac(header.alg) || header.alg != config.jwt_algorithm {
        tracing::debug!(alg = ?header.alg, "Rejected token with unexpected signing algorithm");
        return Err(ApiError::unauthorized());
    }

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    // Signature only; expiry is checked below against the injected clock.
    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected token");
            ApiError::unauthorized()
        })?
        .claims;

    let now = config.clock.now_epoch_secs();
    if claims.exp < now.saturating_sub(config.jwt_clock_skew_secs) {
        tracing::debug!(exp = claims.exp, now, "Rejected expired token");
        return Err(ApiError::unauthorized());
    }

    Ok(claims)
}

/// Issue a token for `user_id`, valid for the configured lifetime.
pub fn generate_jwt_token(config: &AuthConfig, user_id: EntityId) -> ApiResult<String> {
    let claims = Claims::new(user_id, config.jwt_expiration_secs, &*config.clock)?;
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let header = Header::new(config.jwt_algorithm);

    encode(&header, &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}
