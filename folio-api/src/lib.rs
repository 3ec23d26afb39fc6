//! Folio API - REST Layer
//!
//! Axum service exposing users, articles and images. A JWT session cookie
//! guards everything except signup, login and the operational endpoints.
//! Article reads go through a Redis read-through cache; images live in an
//! S3-compatible bucket.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod macros;
pub mod middleware;
pub mod openapi;
pub mod password;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use auth::{generate_jwt_token, validate_jwt_token, AuthConfig, Claims, JwtClock, SystemClock};
pub use config::{resolve_bind_addr, ApiConfig};
pub use db::{DbClient, DbConfig, PgArticleStore, PgUserStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, AuthMiddlewareState, CurrentUser};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use routes::health::{CacheProbe, DatabaseProbe, HealthState, ReadinessProbe};
pub use state::{AppState, ArticleService};
pub use types::*;
