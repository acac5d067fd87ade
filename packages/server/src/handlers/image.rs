use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::BlobRef;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/images/{reference}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Download a stored image",
    description = "Streams the blob behind an image reference such as `products/<uuid>.png`. \
                   References are immutable, so the reference itself is the ETag and a matching \
                   `If-None-Match` yields 304.",
    params(("reference" = String, Path, description = "Image reference")),
    responses(
        (status = 200, description = "Image bytes", content_type = "application/octet-stream"),
        (status = 304, description = "Not modified"),
        (status = 400, description = "Malformed reference (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let reference = BlobRef::parse(&reference)?;

    // Missing blobs are 404 even for a matching or `*` validator.
    let size = state.blob_store.size(&reference).await?;

    let etag_value = format!("\"{reference}\"");
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let reader = state.blob_store.get_stream(&reference).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, reference.content_type())
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}
