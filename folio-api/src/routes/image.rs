//! Image REST API Routes
//!
//! Uploads land in the object store under a fresh `{uuid}.jpg` key; reads
//! stream the object back as `image/jpeg`.

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use folio_core::{FolioError, ImageKey};
use folio_storage::ImageBucket;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    types::{MessageResponse, UploadResponse},
};

/// Multipart field carrying the file.
pub const IMAGE_FIELD: &str = "image";

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

#[utoipa::path(
    post,
    path = "/upload-image",
    tag = "Images",
    request_body(content_type = "multipart/form-data", description = "Form with an `image` file field"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing image field", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Object store failure", body = ApiError),
    ),
)]
pub async fn upload_image(
    State(images): State<ImageBucket>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart
        .map_err(|e| ApiError::missing_field(IMAGE_FIELD).with_details(e.body_text()))?;

    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid_body().with_details(e.body_text()))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::invalid_body().with_details(e.body_text()))?;
            data = Some(bytes);
            break;
        }
    }

    let data = data
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::missing_field(IMAGE_FIELD))?;

    let key = ImageKey::generate();
    let size = images.put(&key, data).await?;

    tracing::info!(key = %key, size, "Image uploaded");
    Ok(Json(UploadResponse {
        message: "Image uploaded successfully".to_string(),
        file_name: key.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/image/{id}",
    tag = "Images",
    params(("id" = String, Path, description = "Object name returned by the upload")),
    responses(
        (status = 200, description = "Raw image bytes", content_type = "image/jpeg"),
        (status = 400, description = "Malformed object name", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Image not found", body = ApiError),
    ),
)]
pub async fn get_image(
    State(images): State<ImageBucket>,
    Path(raw): Path<String>,
) -> ApiResult<Response> {
    let key = ImageKey::parse(&raw).map_err(FolioError::from)?;
    let object = images.get(&key).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/jpeg".to_string()),
            (header::CONTENT_LENGTH, object.size.to_string()),
        ],
        Body::from_stream(object.stream),
    )
        .into_response())
}

#[utoipa::path(
    delete,
    path = "/image/{id}",
    tag = "Images",
    params(("id" = String, Path, description = "Object name returned by the upload")),
    responses(
        (status = 200, description = "Image deleted (also when it was already absent)", body = MessageResponse),
        (status = 400, description = "Malformed object name", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Object store failure", body = ApiError),
    ),
)]
pub async fn delete_image(
    State(images): State<ImageBucket>,
    Path(raw): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let key = ImageKey::parse(&raw).map_err(FolioError::from)?;
    images.delete(&key).await?;

    tracing::info!(key = %key, "Image deleted");
    Ok(Json(MessageResponse::new("Image deleted successfully")))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/upload-image", post(upload_image))
        .route("/image/:id", get(get_image).delete(delete_image))
}
