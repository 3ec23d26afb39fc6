//! Axum Middleware for Session Authentication
//!
//! The auth gate reads the session token from the `Authorization` cookie
//! (or a `Bearer` header), verifies it, resolves the subject to a live user
//! and injects [`CurrentUser`] into the request extensions. Every failure
//! is the same 401.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use folio_core::User;
use folio_storage::{Store, UserStore};

use crate::auth::{validate_jwt_token, AuthConfig};
use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub auth_config: Arc<AuthConfig>,
    /// Subject resolution goes straight to the store, never the cache.
    pub users: Arc<dyn UserStore>,
}

impl AuthMiddlewareState {
    pub fn new(auth_config: Arc<AuthConfig>, users: Arc<dyn UserStore>) -> Self {
        Self { auth_config, users }
    }
}

impl FromRef<AppState> for AuthMiddlewareState {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.auth.clone(), state.users.clone())
    }
}

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

/// Axum middleware guarding every protected route.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware};
/// use folio_api::middleware::{auth_middleware, AuthMiddlewareState};
///
/// let app = Router::new()
///     .route("/validate", axum::routing::get(|| async { "OK" }))
///     .route_layer(middleware::from_fn_with_state(auth_state, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let Some(token) = extract_token(request.headers(), &state.auth_config.cookie_name) else {
        tracing::debug!("No session token presented");
        return Err(AuthMiddlewareError(ApiError::unauthorized()));
    };

    let claims = validate_jwt_token(&state.auth_config, &token).map_err(AuthMiddlewareError)?;

    let Some(user_id) = claims.user_id() else {
        tracing::debug!(sub = %claims.sub, "Token subject is not a user id");
        return Err(AuthMiddlewareError(ApiError::unauthorized()));
    };

    let user = match state.users.find_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::debug!(user_id, "Token subject does not resolve to a live user");
            return Err(AuthMiddlewareError(ApiError::unauthorized()));
        }
        Err(e) => {
            tracing::error!(user_id, error = %e, "User lookup failed during authentication");
            return Err(AuthMiddlewareError(ApiError::unauthorized()));
        }
    };

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Session cookie first, then `Authorization: Bearer <token>`.
pub(crate) fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// The authenticated user, injected by [`auth_middleware`].
///
/// Handlers outside the gate that ask for it get a 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AuthMiddlewareError(ApiError::unauthorized()))
    }
}

impl std::ops::Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let map = headers(&[("cookie", "theme=dark; Authorization=abc.def.ghi")]);
        assert_eq!(
            extract_token(&map, "Authorization").as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn test_extract_token_bearer_fallback() {
        let map = headers(&[("authorization", "Bearer tok")]);
        assert_eq!(extract_token(&map, "Authorization").as_deref(), Some("tok"));
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let map = headers(&[
            ("cookie", "Authorization=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(
            extract_token(&map, "Authorization").as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn test_missing_or_blank_token() {
        assert!(extract_token(&HeaderMap::new(), "Authorization").is_none());
        for (name, value) in [
            ("cookie", "Authorization="),
            ("authorization", "Basic dXNlcg=="),
            ("authorization", "Bearer "),
        ] {
            assert!(extract_token(&headers(&[(name, value)]), "Authorization").is_none());
        }
    }
}
