//! Request extractors with uniform JSON rejections.
//!
//! `JsonBody<T>` swaps axum's plain-text body rejection for the
//! `FAILED TO READ BODY` error, and `PathId` turns a non-numeric `{id}`
//! segment into a 400.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use folio_core::EntityId;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor that rejects with 400 `FAILED TO READ BODY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                let reason = rejection.body_text();
                tracing::debug!(error = %reason, "Rejected request body");
                Err(ApiError::invalid_body().with_details(reason))
            }
        }
    }
}

/// Numeric `{id}` path parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub EntityId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                ApiError::invalid_format("id", "a numeric id").with_details(e.body_text())
            })?;

        raw.trim()
            .parse::<EntityId>()
            .map(PathId)
            .map_err(|_| ApiError::invalid_format("id", "a numeric id").with_details(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        title: String,
    }

    fn router() -> Router {
        Router::new()
            .route("/items/:id", get(|PathId(id): PathId| async move { id.to_string() }))
            .route("/items", post(|JsonBody(_): JsonBody<Payload>| async { "ok" }))
    }

    async fn send(request: axum::http::Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_numeric_path_id() {
        let request = axum::http::Request::get("/items/42").body(Body::empty()).unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_non_numeric_path_id_is_400() {
        let request = axum::http::Request::get("/items/abc").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_FORMAT");
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let request = axum::http::Request::post("/items")
            .header("content-type", "application/json")
            .body(Body::from("{\"title\":"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "FAILED TO READ BODY");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_400() {
        let request = axum::http::Request::post("/items")
            .body(Body::from("{\"title\":\"x\"}"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "FAILED TO READ BODY");
    }
}
