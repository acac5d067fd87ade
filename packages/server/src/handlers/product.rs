use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::query::AppQuery;
use crate::models::product::*;
use crate::models::shared::{MessageResponse, PageQuery};
use crate::models::tournament::TournamentListResponse;
use crate::services::product::{CREATED_MESSAGE, DELETED_MESSAGE, UPDATED_MESSAGE};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "Products",
    operation_id = "listProducts",
    summary = "List products",
    description = "Returns a page of products, newest first, each with its tournament. \
                   `per_page` defaults to the configured catalog page size and is clamped to 1-100.",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of products", body = ProductListResponse),
        (status = 400, description = "Malformed query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<ProductListResponse>, AppError> {
    Ok(Json(state.products.list(&query).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/create",
    tag = "Products",
    operation_id = "createProductForm",
    summary = "Data for the create form",
    description = "Returns the active tournaments a new product can be assigned to, in display order.",
    responses(
        (status = 200, description = "Selectable tournaments", body = TournamentListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn create_product_form(
    State(state): State<AppState>,
) -> Result<Json<TournamentListResponse>, AppError> {
    let tournaments = state.products.create_form().await?;
    Ok(Json(tournaments.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    tag = "Products",
    operation_id = "storeProduct",
    summary = "Create a product",
    description = "Creates a product from a `multipart/form-data` submission. The optional `image` file \
                   becomes the primary image; `gallery_images` (or `gallery_images[]`) files form the \
                   gallery in the order sent. Images must be jpg, jpeg, png, gif or webp and within the \
                   configured size limit.",
    request_body(content_type = "multipart/form-data", description = "Product fields and image files"),
    responses(
        (status = 201, description = "Product created", body = ProductMutationResponse),
        (status = 400, description = "Malformed multipart body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Unique value already in use (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Field validation failed (VALIDATION_ERROR)", body = ErrorBody),
        (status = 502, description = "Image upload failed (STORAGE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form), fields(name = ?form.name))]
pub async fn store_product(
    State(state): State<AppState>,
    form: ProductForm,
) -> Result<impl IntoResponse, AppError> {
    let product = state.products.store(form).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductMutationResponse {
            message: CREATED_MESSAGE.into(),
            product: product.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    tag = "Products",
    operation_id = "showProduct",
    summary = "Get a product",
    description = "Returns a product with its tournament and bookings.",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product details", body = ProductDetailResponse),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductDetailResponse>, AppError> {
    Ok(Json(state.products.show(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/edit",
    tag = "Products",
    operation_id = "editProductForm",
    summary = "Data for the edit form",
    description = "Returns the product together with the active tournaments it can be moved to.",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product and selectable tournaments", body = ProductEditResponse),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn edit_product_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductEditResponse>, AppError> {
    Ok(Json(state.products.edit_form(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    tag = "Products",
    operation_id = "updateProduct",
    summary = "Update a product",
    description = "Updates a product from a `multipart/form-data` submission. Also accepted as POST. \
                   A new `image` replaces the primary image and new gallery files replace the whole \
                   gallery; the old blobs are deleted. `remove_image` and `remove_gallery_images` clear \
                   the images without replacing them. Nullable text fields left out of the form keep \
                   their value; fields sent empty are cleared.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "Product fields and image files"),
    responses(
        (status = 200, description = "Product updated", body = ProductMutationResponse),
        (status = 400, description = "Malformed multipart body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Unique value already in use (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Field validation failed (VALIDATION_ERROR)", body = ErrorBody),
        (status = 502, description = "Image upload failed (STORAGE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    form: ProductForm,
) -> Result<Json<ProductMutationResponse>, AppError> {
    let product = state.products.update(id, form).await?;

    Ok(Json(ProductMutationResponse {
        message: UPDATED_MESSAGE.into(),
        product: product.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    tag = "Products",
    operation_id = "destroyProduct",
    summary = "Delete a product",
    description = "Deletes a product and every image it owns. Products with bookings cannot be deleted.",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Product has bookings (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn destroy_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    state.products.destroy(id).await?;

    Ok(Json(MessageResponse {
        message: DELETED_MESSAGE.into(),
    }))
}
