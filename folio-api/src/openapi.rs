//! OpenAPI Specification for the Folio API
//!
//! Generated by utoipa from the route annotations and request/response
//! types.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{article, health, image, user};
use crate::telemetry::metrics;
use crate::types::*;

use folio_core::Article;

/// OpenAPI document for the Folio API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Folio API",
        version = "0.1.0",
        description = "Users, articles and images behind a JWT session cookie, with a read-through cache for articles",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Users", description = "Signup, login and profiles"),
        (name = "Articles", description = "Articles; reads are served through the cache"),
        (name = "Images", description = "Image objects in the S3-compatible bucket"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        // === User Routes ===
        user::signup,
        user::login,
        user::validate,
        user::get_user,
        user::update_user,
        user::delete_user,

        // === Article Routes ===
        article::create_article,
        article::list_articles,
        article::get_article,
        article::update_article,
        article::delete_article,

        // === Image Routes ===
        image::upload_image,
        image::get_image,
        image::delete_image,

        // === Health & Metrics ===
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            ApiError, ErrorCode,
            SignupRequest, LoginRequest, UpdateUserRequest, UserResponse, UserEnvelope,
            LoginResponse,
            Article, CreateArticleRequest, UpdateArticleRequest, DataSource, ArticleEnvelope,
            CachedArticleEnvelope, ArticleListEnvelope,
            UploadResponse, MessageResponse,
            HealthResponse, HealthStatus, HealthDetails, ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            // Session cookie set by /login
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("Authorization"))),
            );

            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Same token as the session cookie"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Folio API");

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        assert!(components.security_schemes.contains_key("session_cookie"));
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("Article"));
        Ok(())
    }

    #[test]
    fn test_openapi_documents_every_route() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        let value: serde_json::Value =
            serde_json::from_str(&json).map_err(|e| format!("Generated JSON invalid: {}", e))?;

        for path in [
            "/signup",
            "/login",
            "/validate",
            "/users/{id}",
            "/articles",
            "/articles/{id}",
            "/upload-image",
            "/image/{id}",
            "/health/ready",
            "/metrics",
        ] {
            assert!(
                value["paths"].get(path).is_some(),
                "missing path {}",
                path
            );
        }
        Ok(())
    }

    #[test]
    fn test_timestamps_documented_as_date_time_strings() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        let value: serde_json::Value =
            serde_json::from_str(&json).map_err(|e| format!("Generated JSON invalid: {}", e))?;
        let schemas = &value["components"]["schemas"];

        for (schema, field) in [
            ("Article", "created_at"),
            ("Article", "updated_at"),
            ("UserResponse", "created_at"),
            ("UserResponse", "updated_at"),
        ] {
            let property = &schemas[schema]["properties"][field];
            assert_eq!(property["type"], "string", "{}.{}", schema, field);
            assert_eq!(property["format"], "date-time", "{}.{}", schema, field);
        }
        assert!(schemas["Article"]["properties"].get("deleted_at").is_some());
        Ok(())
    }
}
