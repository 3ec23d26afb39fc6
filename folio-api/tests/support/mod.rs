//! Router wiring and request helpers shared by the integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use folio_api::{
    create_api_router, generate_jwt_token, ApiConfig, AppState, AuthConfig, CacheProbe,
    HealthState, ReadinessProbe,
};
use folio_storage::CacheConfig;
use folio_test_utils::{fixtures, InMemoryBackends, Store, User};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-with-enough-length";

/// A router over in-memory backends, with handles to those backends.
pub struct TestApp {
    pub router: Router,
    pub backends: InMemoryBackends,
    pub auth: Arc<AuthConfig>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_auth(AuthConfig::with_secret(TEST_SECRET))
    }

    pub fn with_auth(auth: AuthConfig) -> Self {
        Self::build(auth, CacheConfig::default())
    }

    pub fn with_cache_config(config: CacheConfig) -> Self {
        Self::build(AuthConfig::with_secret(TEST_SECRET), config)
    }

    fn build(auth: AuthConfig, cache_config: CacheConfig) -> Self {
        let backends = InMemoryBackends::new();
        let auth = Arc::new(auth);
        let probes: Vec<Arc<dyn ReadinessProbe>> =
            vec![Arc::new(CacheProbe(backends.cache.clone()))];

        let state = AppState {
            users: backends.users.clone(),
            articles: Arc::new(backends.cached_articles_with(cache_config)),
            images: backends.images.clone(),
            auth: auth.clone(),
            health: HealthState::new(probes),
        };

        let router = create_api_router(state, &ApiConfig::default())
            .expect("router builds with development config");

        Self {
            router,
            backends,
            auth,
        }
    }

    /// Insert a user directly and mint a token for it.
    pub async fn seeded_user(&self, name: &str, email: &str) -> (User, String) {
        let user = self
            .backends
            .users
            .create(fixtures::new_user(name, email))
            .await
            .expect("seed user");
        let token = generate_jwt_token(&self.auth, user.id).expect("mint token");
        (user, token)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        TestResponse {
            status,
            headers,
            body: bytes.to_vec(),
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "body is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

// ============================================================================
// REQUEST BUILDERS
// ============================================================================

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub fn authed_json_request(method: &str, uri: &str, token: &str, body: &Value) -> Request<Body> {
    let mut request = json_request(method, uri, body);
    request
        .headers_mut()
        .insert(header::COOKIE, cookie_value(token).parse().expect("cookie header"));
    request
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

/// Request carrying the session cookie.
pub fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie_value(token))
        .body(Body::empty())
        .expect("valid request")
}

/// Request carrying `Authorization: Bearer` instead of the cookie.
pub fn bearer(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .expect("valid request")
}

pub const BOUNDARY: &str = "folio-test-boundary";

/// `multipart/form-data` upload with one file field.
pub fn multipart_upload(token: &str, field: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"photo.png\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload-image")
        .header(header::COOKIE, cookie_value(token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("valid request")
}

fn cookie_value(token: &str) -> String {
    format!("Authorization={}", token)
}
