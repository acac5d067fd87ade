use axum::body::Bytes;
use axum::extract::multipart::Field;
use axum::extract::{FromRequest, Multipart, Request};

use crate::error::AppError;
use crate::models::product::ProductForm;
use crate::models::shared::FieldErrors;
use crate::state::AppState;
use crate::utils::image::{UploadedFile, too_large_message};

impl FromRequest<AppState> for ProductForm {
    type Rejection = AppError;

    /// Read a `multipart/form-data` product submission.
    ///
    /// Gallery files are accepted as `gallery_images` or `gallery_images[]`.
    /// A file part larger than the image limit is not buffered; it becomes a
    /// field error instead. Unknown fields are ignored.
    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let max_bytes = state.config.images.max_size_bytes();
        let mut form = ProductForm::default();
        let mut gallery_index = 0usize;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                "image" => {
                    form.image = read_file(field, "image", max_bytes, &mut form.upload_errors).await?;
                }
                "gallery_images" | "gallery_images[]" => {
                    let key = format!("gallery_images.{gallery_index}");
                    if let Some(mut file) = read_file(field, &key, max_bytes, &mut form.upload_errors).await? {
                        if file.is_blank() {
                            continue;
                        }
                        file.position = Some(gallery_index);
                        form.gallery_images.push(file);
                    }
                    gallery_index += 1;
                }
                "name" => form.name = Some(read_text(field, &name).await?),
                "description" => form.description = Some(read_text(field, &name).await?),
                "price" => form.price = Some(read_text(field, &name).await?),
                "stock" => form.stock = Some(read_text(field, &name).await?),
                "tournament_id" => form.tournament_id = Some(read_text(field, &name).await?),
                "sku" => form.sku = Some(read_text(field, &name).await?),
                "weight" => form.weight = Some(read_text(field, &name).await?),
                "dimensions" => form.dimensions = Some(read_text(field, &name).await?),
                "is_active" => form.is_active = Some(read_text(field, &name).await?),
                "remove_image" => form.remove_image = Some(read_text(field, &name).await?),
                "remove_gallery_images" => {
                    form.remove_gallery_images = Some(read_text(field, &name).await?)
                }
                _ => {} // Ignore unknown fields.
            }
        }

        Ok(form)
    }
}

async fn read_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

/// Buffer a file part up to `max_bytes`. Oversized parts are abandoned
/// mid-stream and reported under `key`.
async fn read_file(
    mut field: Field<'_>,
    key: &str,
    max_bytes: u64,
    errors: &mut FieldErrors,
) -> Result<Option<UploadedFile>, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);

    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (data.len() + chunk.len()) as u64 > max_bytes {
            errors.add(key, too_large_message(key, max_bytes));
            return Ok(None);
        }
        data.extend_from_slice(&chunk);
    }

    Ok(Some(UploadedFile {
        file_name,
        content_type,
        data: Bytes::from(data),
        position: None,
    }))
}
