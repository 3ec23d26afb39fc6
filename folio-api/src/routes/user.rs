//! User REST API Routes
//!
//! Signup and login are public. Session validation and the profile
//! endpoints sit behind the auth gate.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;
use folio_core::{NewUser, UserUpdate};
use folio_storage::{Store, UserStore};

use crate::{
    auth::{generate_jwt_token, AuthConfig},
    error::{ApiError, ApiResult},
    extractors::{JsonBody, PathId},
    middleware::CurrentUser,
    password::{hash_password, verify_password},
    state::AppState,
    types::{
        LoginRequest, LoginResponse, MessageResponse, SignupRequest, UpdateUserRequest,
        UserEnvelope,
    },
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// Register a new user.
#[utoipa::path(
    post,
    path = "/signup",
    tag = "Users",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User registered", body = UserEnvelope),
        (status = 400, description = "Unreadable body or missing field", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError),
    ),
)]
pub async fn signup(
    State(users): State<Arc<dyn UserStore>>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = required(&req.name, "name")?;
    let email = required(&req.email, "email")?;
    if req.password.is_empty() {
        return Err(ApiError::missing_field("password"));
    }

    // Not transactional; the partial unique index catches the race.
    if users.find_by_email(email).await?.is_some() {
        return Err(ApiError::entity_already_exists(
            "User with this email already exists",
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = users
        .create(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok(Json(UserEnvelope::new("User Registered Successfully", user)))
}

/// Exchange credentials for a session token, also set as a cookie.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; token also set in the Authorization cookie", body = LoginResponse),
        (status = 400, description = "Unreadable body", body = ApiError),
        (status = 401, description = "Invalid Email or Password", body = ApiError),
    ),
)]
pub async fn login(
    State(users): State<Arc<dyn UserStore>>,
    State(auth): State<Arc<AuthConfig>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::invalid_body());
    }

    let Some(user) = users.find_by_email(email).await? else {
        tracing::debug!("Login for unknown email");
        return Err(ApiError::invalid_credentials());
    };

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Login with wrong password");
        return Err(ApiError::invalid_credentials());
    }

    let token = generate_jwt_token(&auth, user.id)?;
    let cookie = session_cookie(&auth, &token);

    tracing::info!(user_id = user.id, "User logged in");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            message: "Logged in".to_string(),
            token,
            data: user.into(),
        }),
    ))
}

/// Echo the authenticated user.
#[utoipa::path(
    get,
    path = "/validate",
    tag = "Users",
    responses(
        (status = 200, description = "Session is valid", body = UserEnvelope),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn validate(CurrentUser(user): CurrentUser) -> Json<UserEnvelope> {
    Json(UserEnvelope::new("Logged in", user))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserEnvelope),
        (status = 400, description = "Non-numeric id", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
    ),
)]
pub async fn get_user(
    State(users): State<Arc<dyn UserStore>>,
    PathId(id): PathId,
) -> ApiResult<Json<UserEnvelope>> {
    let user = users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("User", id))?;

    Ok(Json(UserEnvelope::new("Get User Successfully", user)))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserEnvelope),
        (status = 400, description = "Invalid id or body", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
        (status = 409, description = "Email belongs to another user", body = ApiError),
    ),
)]
pub async fn update_user(
    State(users): State<Arc<dyn UserStore>>,
    PathId(id): PathId,
    body: Result<JsonBody<UpdateUserRequest>, ApiError>,
) -> ApiResult<Json<UserEnvelope>> {
    // A missing record answers 404 before the body is looked at.
    users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("User", id))?;
    let JsonBody(req) = body?;

    let update = UserUpdate {
        name: optional(req.name.as_deref(), "name")?,
        email: optional(req.email.as_deref(), "email")?,
    };

    if let Some(email) = update.email.as_deref() {
        if let Some(owner) = users.find_by_email(email).await? {
            if owner.id != id {
                return Err(ApiError::entity_already_exists(
                    "User with this email already exists",
                ));
            }
        }
    }

    let user = users.update(id, update).await?;
    tracing::info!(user_id = user.id, "User updated");
    Ok(Json(UserEnvelope::new("User updated successfully", user)))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User soft-deleted", body = MessageResponse),
        (status = 400, description = "Non-numeric id", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
    ),
)]
pub async fn delete_user(
    State(users): State<Arc<dyn UserStore>>,
    PathId(id): PathId,
) -> ApiResult<Json<MessageResponse>> {
    users.delete(id).await?;
    tracing::info!(user_id = id, "User deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

// ============================================================================
// HELPERS
// ============================================================================

/// `Set-Cookie` value for the session token.
fn session_cookie(config: &AuthConfig, token: &str) -> String {
    let cookie = Cookie::build((config.cookie_name.clone(), token.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(config.cookie_secure)
        .max_age(Duration::seconds(config.jwt_expiration_secs))
        .build();
    cookie.to_string()
}

fn required<'a>(value: &'a str, field: &str) -> ApiResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::missing_field(field));
    }
    Ok(trimmed)
}

fn optional(value: Option<&str>, field: &str) -> ApiResult<Option<String>> {
    value
        .map(|v| required(v, field).map(str::to_string))
        .transpose()
}

// ============================================================================
// ROUTER
// ============================================================================

/// Signup and login.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

/// Routes that need an authenticated caller.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/validate", get(validate))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}
