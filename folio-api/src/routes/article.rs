//! Article REST API Routes
//!
//! Reads go through the read-through cache and report which layer served
//! them. Writes go straight to the store and leave cached copies as they
//! are, so a cached article can be stale until its entry expires.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use folio_core::{ArticleUpdate, NewArticle};
use folio_storage::{CacheRead, CachedReader, Store};

use crate::{
    error::{ApiError, ApiResult},
    extractors::{JsonBody, PathId},
    middleware::CurrentUser,
    state::{AppState, ArticleService},
    telemetry::record_cache_read,
    types::{
        ArticleEnvelope, ArticleListEnvelope, CachedArticleEnvelope, CreateArticleRequest,
        DataSource, MessageResponse, UpdateArticleRequest,
    },
};

const ENTITY: &str = "article";

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

#[utoipa::path(
    post,
    path = "/articles",
    tag = "Articles",
    request_body = CreateArticleRequest,
    responses(
        (status = 200, description = "Article created", body = ArticleEnvelope),
        (status = 400, description = "Unreadable body or missing field", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn create_article(
    State(articles): State<Arc<ArticleService>>,
    CurrentUser(author): CurrentUser,
    JsonBody(req): JsonBody<CreateArticleRequest>,
) -> ApiResult<Json<ArticleEnvelope>> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::missing_field("title"));
    }
    if req.content.trim().is_empty() {
        return Err(ApiError::missing_field("content"));
    }

    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .unwrap_or(author.email);

    let article = articles
        .create(NewArticle {
            email,
            title: title.to_string(),
            content: req.content,
        })
        .await?;

    tracing::info!(article_id = article.id, "Article created");
    Ok(Json(ArticleEnvelope {
        message: "Article Created Successfully".to_string(),
        data: article,
    }))
}

#[utoipa::path(
    get,
    path = "/articles",
    tag = "Articles",
    responses(
        (status = 200, description = "Live articles, from cache or database", body = ArticleListEnvelope),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Cache or database failure", body = ApiError),
    ),
)]
pub async fn list_articles(
    State(articles): State<Arc<ArticleService>>,
) -> ApiResult<Json<ArticleListEnvelope>> {
    let (data, source) = observe(articles.list_cached().await?);

    Ok(Json(ArticleListEnvelope {
        message: format!("Get Articles Successfully (from {})", source.as_str()),
        source,
        data,
    }))
}

#[utoipa::path(
    get,
    path = "/articles/{id}",
    tag = "Articles",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article, from cache or database", body = CachedArticleEnvelope),
        (status = 400, description = "Non-numeric id", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Article not found", body = ApiError),
        (status = 500, description = "Cache or database failure", body = ApiError),
    ),
)]
pub async fn get_article(
    State(articles): State<Arc<ArticleService>>,
    PathId(id): PathId,
) -> ApiResult<Json<CachedArticleEnvelope>> {
    let read = articles
        .get_cached(id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Article", id))?;
    let (data, source) = observe(read);

    Ok(Json(CachedArticleEnvelope {
        message: format!("Get Article by ID Successfully (from {})", source.as_str()),
        source,
        data,
    }))
}

#[utoipa::path(
    put,
    path = "/articles/{id}",
    tag = "Articles",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Article updated; cached copies are not refreshed", body = ArticleEnvelope),
        (status = 400, description = "Invalid id or body", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Article not found", body = ApiError),
    ),
)]
pub async fn update_article(
    State(articles): State<Arc<ArticleService>>,
    PathId(id): PathId,
    body: Result<JsonBody<UpdateArticleRequest>, ApiError>,
) -> ApiResult<Json<ArticleEnvelope>> {
    articles
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Article", id))?;
    let JsonBody(req) = body?;

    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::validation_failed("title must not be empty"));
    }

    let article = articles
        .update(
            id,
            ArticleUpdate {
                title: req.title.map(|t| t.trim().to_string()),
                content: req.content,
            },
        )
        .await?;

    tracing::info!(article_id = id, "Article updated");
    Ok(Json(ArticleEnvelope {
        message: "Article updated successfully".to_string(),
        data: article,
    }))
}

#[utoipa::path(
    delete,
    path = "/articles/{id}",
    tag = "Articles",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article soft-deleted", body = MessageResponse),
        (status = 400, description = "Non-numeric id", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Article not found", body = ApiError),
    ),
)]
pub async fn delete_article(
    State(articles): State<Arc<ArticleService>>,
    PathId(id): PathId,
) -> ApiResult<Json<MessageResponse>> {
    articles.delete(id).await?;
    tracing::info!(article_id = id, "Article deleted");
    Ok(Json(MessageResponse::new("Article deleted successfully")))
}

/// Count the read and split it into value and source.
fn observe<T>(read: CacheRead<T>) -> (T, DataSource) {
    let (value, source) = read.into_parts();
    record_cache_read(ENTITY, source.as_str());
    (value, source.into())
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/:id",
            get(get_article).put(update_article).delete(delete_article),
        )
}

