//! End-to-end request flows over in-memory backends.
//!
//! Every test drives the full router (auth gate, extractors, handlers and
//! error mapping) with `tower::ServiceExt::oneshot`.

mod support;

use std::time::Duration;

use axum::http::{header, StatusCode};
use folio_storage::{CacheConfig, CacheKey};
use folio_test_utils::{fixtures, Article, Store};
use serde_json::json;
use support::*;

// ============================================================================
// USERS AND SESSIONS
// ============================================================================

#[tokio::test]
async fn signup_then_duplicate_email_conflicts() {
    let app = TestApp::new();
    let body = fixtures::signup_body("Ada", "ada@example.com", "s3cret");

    let first = app.send(json_request("POST", "/signup", &body)).await;
    assert_eq!(first.status, StatusCode::OK);
    let json = first.json();
    assert_eq!(json["message"], "User Registered Successfully");
    assert_eq!(json["data"]["email"], "ada@example.com");
    assert!(json["data"].get("password_hash").is_none());
    assert!(json["data"].get("password").is_none());

    let second = app.send(json_request("POST", "/signup", &body)).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.json()["code"], "ENTITY_ALREADY_EXISTS");
    assert_eq!(app.backends.users.create_calls(), 1);
}

#[tokio::test]
async fn signup_stores_a_hash_not_the_password() {
    let app = TestApp::new();
    let body = fixtures::signup_body("Ada", "ada@example.com", "plain-text-password");
    app.send(json_request("POST", "/signup", &body)).await;

    let rows = app.backends.users.snapshot().await;
    assert_eq!(rows.len(), 1);
    assert_ne!(rows[0].password_hash, "plain-text-password");
    assert!(rows[0].password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn signup_with_missing_field_is_rejected() {
    let app = TestApp::new();
    let body = fixtures::signup_body("   ", "ada@example.com", "pw");

    let response = app.send(json_request("POST", "/signup", &body)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.backends.users.create_calls(), 0);
}

#[tokio::test]
async fn login_sets_session_cookie_and_returns_token() {
    let app = TestApp::new();
    app.send(json_request(
        "POST",
        "/signup",
        &fixtures::signup_body("Ada", "ada@example.com", "s3cret"),
    ))
    .await;

    let response = app
        .send(json_request(
            "POST",
            "/login",
            &fixtures::login_body("ada@example.com", "s3cret"),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let cookie = response
        .header(header::SET_COOKIE)
        .expect("login sets a cookie")
        .to_string();
    assert!(cookie.starts_with("Authorization="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=2592000"));

    let json = response.json();
    assert_eq!(json["message"], "Logged in");
    let token = json["token"].as_str().expect("token in body");
    assert!(cookie.contains(token));

    let validated = app.send(authed("GET", "/validate", token)).await;
    assert_eq!(validated.status, StatusCode::OK);
    assert_eq!(validated.json()["data"]["email"], "ada@example.com");
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = TestApp::new();
    app.send(json_request(
        "POST",
        "/signup",
        &fixtures::signup_body("Ada", "ada@example.com", "s3cret"),
    ))
    .await;

    let wrong_password = app
        .send(json_request(
            "POST",
            "/login",
            &fixtures::login_body("ada@example.com", "nope"),
        ))
        .await;
    let unknown_email = app
        .send(json_request(
            "POST",
            "/login",
            &fixtures::login_body("nobody@example.com", "s3cret"),
        ))
        .await;

    for response in [&wrong_password, &unknown_email] {
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.json()["error"], "Invalid Email or Password");
        assert!(response.header(header::SET_COOKIE).is_none());
    }
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = TestApp::new();
    let (user, token) = app.seeded_user("Ada", "ada@example.com").await;
    let uri = format!("/users/{}", user.id);

    let anonymous = app.send(get(&uri)).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.json()["error"], "Unauthorized");

    for path in ["/articles", "/validate", "/image/x.jpg"] {
        assert_eq!(app.send(get(path)).await.status, StatusCode::UNAUTHORIZED);
    }

    let with_cookie = app.send(authed("GET", &uri, &token)).await;
    assert_eq!(with_cookie.status, StatusCode::OK);
    assert_eq!(with_cookie.json()["message"], "Get User Successfully");
}

#[tokio::test]
async fn bearer_header_is_accepted() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;

    let response = app.send(bearer("GET", "/validate", &token)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn deleted_users_token_is_rejected() {
    let app = TestApp::new();
    let (user, token) = app.seeded_user("Ada", "ada@example.com").await;

    let deleted = app
        .send(authed("DELETE", &format!("/users/{}", user.id), &token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json()["message"], "User deleted successfully");

    let after = app.send(authed("GET", "/validate", &token)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);

    // Soft delete: the row is still there.
    let rows = app.backends.users.snapshot().await;
    assert!(rows[0].deleted_at.is_some());
}

#[tokio::test]
async fn update_user_rejects_taken_email() {
    let app = TestApp::new();
    let (ada, token) = app.seeded_user("Ada", "ada@example.com").await;
    app.seeded_user("Grace", "grace@example.com").await;

    let taken = app
        .send(authed_json_request(
            "PUT",
            &format!("/users/{}", ada.id),
            &token,
            &json!({ "email": "grace@example.com" }),
        ))
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);

    let renamed = app
        .send(authed_json_request(
            "PUT",
            &format!("/users/{}", ada.id),
            &token,
            &json!({ "name": "Ada Lovelace" }),
        ))
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.json()["data"]["name"], "Ada Lovelace");
    assert_eq!(renamed.json()["data"]["email"], "ada@example.com");
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;

    let response = app.send(authed("GET", "/users/999", &token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["code"], "ENTITY_NOT_FOUND");
}

#[tokio::test]
async fn update_of_missing_user_is_not_found_before_conflict() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;

    let response = app
        .send(authed_json_request(
            "PUT",
            "/users/999",
            &token,
            &json!({ "email": "ada@example.com" }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["code"], "ENTITY_NOT_FOUND");

    // Field validation does not mask the missing record either.
    let blank = app
        .send(authed_json_request(
            "PUT",
            "/users/999",
            &token,
            &json!({ "name": "   " }),
        ))
        .await;
    assert_eq!(blank.status, StatusCode::NOT_FOUND);
    assert_eq!(app.backends.users.update_calls(), 0);
}

#[tokio::test]
async fn delete_of_missing_user_is_not_found() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;

    let response = app.send(authed("DELETE", "/users/999", &token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.backends.users.delete_calls(), 1);
}

// ============================================================================
// ARTICLES AND THE READ-THROUGH CACHE
// ============================================================================

#[tokio::test]
async fn create_article_defaults_author_email() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;

    let response = app
        .send(authed_json_request(
            "POST",
            "/articles",
            &token,
            &fixtures::article_body("Notes", "On the engine"),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let json = response.json();
    assert_eq!(json["message"], "Article Created Successfully");
    assert_eq!(json["data"]["email"], "ada@example.com");
    assert_eq!(json["data"]["title"], "Notes");
}

#[tokio::test]
async fn second_read_is_served_from_cache() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;
    let article = app
        .backends
        .articles
        .create(fixtures::new_article("ada@example.com", "cached"))
        .await
        .unwrap();
    let uri = format!("/articles/{}", article.id);

    let cold = app.send(authed("GET", &uri, &token)).await;
    assert_eq!(cold.status, StatusCode::OK);
    assert_eq!(cold.json()["source"], "database");
    assert_eq!(
        cold.json()["message"],
        "Get Article by ID Successfully (from database)"
    );
    assert_eq!(app.backends.articles.find_calls(), 1);

    let warm = app.send(authed("GET", &uri, &token)).await;
    assert_eq!(warm.json()["source"], "cache");
    assert_eq!(app.backends.articles.find_calls(), 1);
    assert_eq!(cold.json()["data"], warm.json()["data"]);
}

#[tokio::test]
async fn updates_do_not_refresh_cached_reads() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;
    let article = app
        .backends
        .articles
        .create(fixtures::new_article("ada@example.com", "before"))
        .await
        .unwrap();
    let uri = format!("/articles/{}", article.id);

    app.send(authed("GET", &uri, &token)).await;

    let updated = app
        .send(authed_json_request(
            "PUT",
            &uri,
            &token,
            &json!({ "title": "after" }),
        ))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json()["message"], "Article updated successfully");
    assert_eq!(updated.json()["data"]["title"], "after");

    let stale = app.send(authed("GET", &uri, &token)).await;
    assert_eq!(stale.json()["source"], "cache");
    assert_eq!(stale.json()["data"]["title"], "before");
}

#[tokio::test]
async fn deleted_article_stays_readable_until_expiry() {
    let app = TestApp::with_cache_config(
        CacheConfig::new().with_item_ttl(Duration::from_millis(50)),
    );
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;
    let article = app
        .backends
        .articles
        .create(fixtures::new_article("ada@example.com", "short-lived"))
        .await
        .unwrap();
    let uri = format!("/articles/{}", article.id);

    app.send(authed("GET", &uri, &token)).await;
    let deleted = app.send(authed("DELETE", &uri, &token)).await;
    assert_eq!(deleted.json()["message"], "Article deleted successfully");

    let cached = app.send(authed("GET", &uri, &token)).await;
    assert_eq!(cached.status, StatusCode::OK);
    assert_eq!(cached.json()["source"], "cache");

    tokio::time::sleep(Duration::from_millis(100)).await;
    let expired = app.send(authed("GET", &uri, &token)).await;
    assert_eq!(expired.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_articles_reports_source() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;
    fixtures::seed_articles(&app.backends.articles, "ada@example.com", 3)
        .await
        .unwrap();

    let cold = app.send(authed("GET", "/articles", &token)).await;
    assert_eq!(cold.status, StatusCode::OK);
    let json = cold.json();
    assert_eq!(json["message"], "Get Articles Successfully (from database)");
    assert_eq!(json["data"].as_array().map(Vec::len), Some(3));

    let warm = app.send(authed("GET", "/articles", &token)).await;
    assert_eq!(
        warm.json()["message"],
        "Get Articles Successfully (from cache)"
    );
    assert_eq!(app.backends.articles.list_calls(), 1);
}

#[tokio::test]
async fn missing_article_is_not_cached() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;

    for _ in 0..2 {
        let response = app.send(authed("GET", "/articles/42", &token)).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }
    assert_eq!(app.backends.articles.find_calls(), 2);
    assert!(
        !app.backends
            .cache
            .contains(&CacheKey::item::<Article>(42))
            .await
    );
}

#[tokio::test]
async fn cache_outage_fails_reads_without_touching_store() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;
    let article = app
        .backends
        .articles
        .create(fixtures::new_article("ada@example.com", "a"))
        .await
        .unwrap();
    app.backends.cache.set_fail_gets(true);

    let response = app
        .send(authed("GET", &format!("/articles/{}", article.id), &token))
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["code"], "CACHE_ERROR");
    assert_eq!(app.backends.articles.find_calls(), 0);
}

#[tokio::test]
async fn corrupt_cache_entry_fails_the_read() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;
    app.backends
        .cache
        .insert_raw(&CacheKey::collection::<Article>(), "not json")
        .await;

    let response = app.send(authed("GET", "/articles", &token)).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.backends.articles.list_calls(), 0);
}

#[tokio::test]
async fn cache_write_failure_fails_the_read() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;
    fixtures::seed_articles(&app.backends.articles, "ada@example.com", 1)
        .await
        .unwrap();
    app.backends.cache.set_fail_sets(true);

    let response = app.send(authed("GET", "/articles", &token)).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn database_outage_is_a_server_error() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;
    app.backends.articles.set_failing(true);

    let response = app.send(authed("GET", "/articles", &token)).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["code"], "DATABASE_ERROR");
}

// ============================================================================
// REQUEST VALIDATION
// ============================================================================

#[tokio::test]
async fn unreadable_body_is_rejected() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"name\": "))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "FAILED TO READ BODY");
    assert_eq!(response.json()["code"], "INVALID_BODY");
}

#[tokio::test]
async fn non_numeric_id_is_rejected() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;

    let response = app.send(authed("GET", "/articles/abc", &token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "INVALID_FORMAT");
    assert_eq!(app.backends.articles.find_calls(), 0);
}

#[tokio::test]
async fn blank_article_title_is_rejected() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;

    let response = app
        .send(authed_json_request(
            "POST",
            "/articles",
            &token,
            &fixtures::article_body("  ", "content"),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.backends.articles.create_calls(), 0);
}

#[tokio::test]
async fn update_of_missing_article_is_not_found_before_validation() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;

    let response = app
        .send(authed_json_request(
            "PUT",
            "/articles/999",
            &token,
            &json!({ "title": "" }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["code"], "ENTITY_NOT_FOUND");
    assert_eq!(app.backends.articles.update_calls(), 0);

    let unreadable = axum::http::Request::builder()
        .method("PUT")
        .uri("/articles/999")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, format!("Authorization={}", token))
        .body(axum::body::Body::from("{\"title\": "))
        .unwrap();
    assert_eq!(app.send(unreadable).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_title_on_existing_article_is_rejected() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;
    let article = app
        .backends
        .articles
        .create(fixtures::new_article("ada@example.com", "kept"))
        .await
        .unwrap();

    let response = app
        .send(authed_json_request(
            "PUT",
            &format!("/articles/{}", article.id),
            &token,
            &json!({ "title": "  " }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.backends.articles.update_calls(), 0);
}

// ============================================================================
// IMAGES
// ============================================================================

#[tokio::test]
async fn image_upload_fetch_delete() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;
    let data = b"\x89PNG\r\n\x1a\nnot really a png";

    let uploaded = app.send(multipart_upload(&token, "image", data)).await;
    assert_eq!(uploaded.status, StatusCode::OK);
    let json = uploaded.json();
    assert_eq!(json["message"], "Image uploaded successfully");
    let name = json["fileName"].as_str().expect("fileName").to_string();
    assert!(name.ends_with(".jpg"));

    let fetched = app
        .send(authed("GET", &format!("/image/{}", name), &token))
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.header(header::CONTENT_TYPE), Some("image/jpeg"));
    assert_eq!(fetched.body, data.to_vec());

    let deleted = app
        .send(authed("DELETE", &format!("/image/{}", name), &token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = app
        .send(authed("GET", &format!("/image/{}", name), &token))
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let again = app
        .send(authed("DELETE", &format!("/image/{}", name), &token))
        .await;
    assert_eq!(again.status, StatusCode::OK);
}

#[tokio::test]
async fn upload_without_image_field_is_rejected() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;

    let response = app.send(multipart_upload(&token, "file", b"bytes")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_image_key_is_rejected() {
    let app = TestApp::new();
    let (_user, token) = app.seeded_user("Ada", "ada@example.com").await;

    let response = app.send(authed("GET", "/image/bad..name", &token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// OPERATIONAL ENDPOINTS
// ============================================================================

#[tokio::test]
async fn readiness_follows_cache_health() {
    let app = TestApp::new();

    let ready = app.send(get("/health/ready")).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.json()["status"], "healthy");

    app.backends.cache.set_fail_gets(true);
    let degraded = app.send(get("/health/ready")).await;
    assert_eq!(degraded.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(degraded.json()["details"]["components"]["cache"]["status"], "unhealthy");
}

#[tokio::test]
async fn operational_endpoints_are_public() {
    let app = TestApp::new();

    assert_eq!(app.send(get("/health/ping")).await.status, StatusCode::OK);
    assert_eq!(app.send(get("/health/live")).await.status, StatusCode::OK);

    let metrics = app.send(get("/metrics")).await;
    assert_eq!(metrics.status, StatusCode::OK);

    let document = app.send(get("/openapi.json")).await;
    assert_eq!(document.status, StatusCode::OK);
    assert!(document.json()["paths"].get("/articles/{id}").is_some());
}
