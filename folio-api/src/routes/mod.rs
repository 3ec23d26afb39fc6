//! REST API Routes Module
//!
//! Public routes (signup, login, health, metrics, OpenAPI) and the
//! protected user, article and image routes behind the auth gate.

pub mod article;
pub mod health;
pub mod image;
pub mod user;

use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::middleware::{auth_middleware, AuthMiddlewareState};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Create the complete API router.
///
/// # Middleware Order (outer to inner)
/// 1. CORS - handles preflight requests
/// 2. Observability - tracing and metrics
/// 3. Body limit
/// 4. Auth gate (protected routes only)
///
/// In production, configuration is validated before anything is built.
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> ApiResult<Router> {
    if api_config.is_production() {
        state.auth.validate_for_production()?;
        api_config.validate_for_production()?;
    }

    let auth_state = AuthMiddlewareState::from_ref(&state);

    let protected = Router::new()
        .merge(user::protected_routes())
        .merge(article::create_router())
        .merge(image::create_router())
        .route_layer(from_fn_with_state(auth_state, auth_middleware));

    #[allow(unused_mut)]
    let mut router = Router::new()
        .merge(user::public_routes())
        .merge(protected)
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json));

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa_swagger_ui::SwaggerUi;
        router =
            router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()));
    }

    let cors = build_cors_layer(api_config);

    Ok(router
        .layer(DefaultBodyLimit::max(api_config.max_body_bytes))
        .layer(from_fn(observability_middleware))
        .layer(cors)
        .with_state(state))
}

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}
