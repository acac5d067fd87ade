use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::ImageConfig;
use crate::entity::{booking, product};
use crate::utils::image::{ImageUpload, UploadedFile, validate_image};

use super::shared::{FieldErrors, Pagination};
use super::tournament::TournamentResponse;

pub const NAME_MAX_CHARS: usize = 255;

/// Largest value that fits `DECIMAL(10, 2)`.
pub const PRICE_MAX: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// A persisted product.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub tournament_id: i32,
    pub image: Option<String>,
    pub gallery_images: Option<Vec<String>>,
    pub sku: Option<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The writable columns of a product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub tournament_id: i32,
    pub image: Option<String>,
    pub gallery_images: Option<Vec<String>>,
    pub sku: Option<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    pub is_active: bool,
}

impl Product {
    pub fn record(&self) -> ProductRecord {
        ProductRecord {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            stock: self.stock,
            tournament_id: self.tournament_id,
            image: self.image.clone(),
            gallery_images: self.gallery_images.clone(),
            sku: self.sku.clone(),
            weight: self.weight.clone(),
            dimensions: self.dimensions.clone(),
            is_active: self.is_active,
        }
    }
}

/// Decode the JSON gallery column, ignoring non-string entries.
pub fn gallery_from_json(value: Option<serde_json::Value>) -> Option<Vec<String>> {
    value.and_then(|v| {
        v.as_array().map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
    })
}

pub fn gallery_to_json(gallery: Option<&[String]>) -> Option<serde_json::Value> {
    gallery.map(|refs| serde_json::Value::from(refs.to_vec()))
}

impl From<product::Model> for Product {
    fn from(m: product::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            price: m.price,
            stock: m.stock,
            tournament_id: m.tournament_id,
            image: m.image,
            gallery_images: gallery_from_json(m.gallery_images),
            sku: m.sku,
            weight: m.weight,
            dimensions: m.dimensions,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: i32,
    pub product_id: i32,
    pub customer_name: String,
    pub quantity: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<booking::Model> for Booking {
    fn from(m: booking::Model) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            customer_name: m.customer_name,
            quantity: m.quantity,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

/// Raw multipart submission for store/update.
///
/// Text fields are `None` when the form omitted them and `Some` (possibly
/// empty) when submitted. File parts that exceeded the size limit while
/// streaming are reported through `upload_errors` rather than buffered.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub stock: Option<String>,
    pub tournament_id: Option<String>,
    pub sku: Option<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    pub is_active: Option<String>,
    pub remove_image: Option<String>,
    pub remove_gallery_images: Option<String>,
    pub image: Option<UploadedFile>,
    pub gallery_images: Vec<UploadedFile>,
    pub upload_errors: FieldErrors,
}

impl ProductForm {
    /// Tournament id as submitted, when it parses.
    pub fn requested_tournament(&self) -> Option<i32> {
        self.tournament_id.as_deref()?.trim().parse().ok()
    }

    /// Trimmed, non-empty SKU as submitted.
    pub fn requested_sku(&self) -> Option<&str> {
        self.sku
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A validated product submission.
///
/// Nullable fields use `Option<Option<_>>`: outer `None` leaves the stored
/// value alone on update, `Some(None)` clears it.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<Option<String>>,
    pub price: Decimal,
    pub stock: i32,
    pub tournament_id: i32,
    pub sku: Option<Option<String>>,
    pub weight: Option<Option<String>>,
    pub dimensions: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub image: Option<ImageUpload>,
    pub gallery_images: Vec<ImageUpload>,
    pub remove_image: bool,
    pub remove_gallery_images: bool,
}

impl ProductInput {
    /// Validate the field-level rules. Existence and uniqueness checks that
    /// need the database are done by the caller.
    pub fn from_form(form: ProductForm, limits: &ImageConfig) -> Result<Self, FieldErrors> {
        let mut errors = form.upload_errors;

        let name = match form.name.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("name", "The name field is required.");
                None
            }
            Some(n) if n.chars().count() > NAME_MAX_CHARS => {
                errors.add(
                    "name",
                    format!("The name field must not be greater than {NAME_MAX_CHARS} characters."),
                );
                None
            }
            Some(n) => Some(n.to_string()),
        };

        let price = required(&mut errors, "price", form.price.as_deref())
            .and_then(|raw| record(&mut errors, "price", parse_price(raw)));
        let stock = required(&mut errors, "stock", form.stock.as_deref())
            .and_then(|raw| record(&mut errors, "stock", parse_stock(raw)));
        let tournament_id = required(&mut errors, "tournament_id", form.tournament_id.as_deref())
            .and_then(|raw| {
                let parsed = raw.parse::<i32>().ok().filter(|id| *id > 0);
                if parsed.is_none() {
                    errors.add("tournament_id", "The selected tournament id is invalid.");
                }
                parsed
            });

        let is_active = form
            .is_active
            .as_deref()
            .and_then(|raw| record(&mut errors, "is_active", parse_bool("is_active", raw)))
            .flatten();
        let remove_image = form
            .remove_image
            .as_deref()
            .and_then(|raw| record(&mut errors, "remove_image", parse_bool("remove_image", raw)))
            .flatten()
            .unwrap_or(false);
        let remove_gallery_images = form
            .remove_gallery_images
            .as_deref()
            .and_then(|raw| {
                record(
                    &mut errors,
                    "remove_gallery_images",
                    parse_bool("remove_gallery_images", raw),
                )
            })
            .flatten()
            .unwrap_or(false);

        let max_bytes = limits.max_size_bytes();
        let image = form
            .image
            .filter(|f| !f.is_blank())
            .and_then(|f| record(&mut errors, "image", validate_image(&f, "image", max_bytes)));

        let files: Vec<UploadedFile> = form
            .gallery_images
            .into_iter()
            .filter(|f| !f.is_blank())
            .collect();
        if files.len() > limits.max_gallery_files {
            errors.add(
                "gallery_images",
                format!(
                    "The gallery images field must not have more than {} items.",
                    limits.max_gallery_files
                ),
            );
        }
        let mut gallery_images = Vec::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            let field = format!("gallery_images.{}", file.position.unwrap_or(i));
            if let Some(upload) = record(&mut errors, &field, validate_image(file, &field, max_bytes)) {
                gallery_images.push(upload);
            }
        }

        match (name, price, stock, tournament_id) {
            (Some(name), Some(price), Some(stock), Some(tournament_id)) if errors.is_empty() => {
                Ok(Self {
                    name,
                    description: nullable_text(form.description),
                    price,
                    stock,
                    tournament_id,
                    sku: nullable_text(form.sku),
                    weight: nullable_text(form.weight),
                    dimensions: nullable_text(form.dimensions),
                    is_active,
                    image,
                    gallery_images,
                    remove_image,
                    remove_gallery_images,
                })
            }
            _ => Err(errors),
        }
    }
}

fn required<'a>(errors: &mut FieldErrors, field: &str, value: Option<&'a str>) -> Option<&'a str> {
    match value.map(str::trim) {
        None | Some("") => {
            errors.add(field, format!("The {} field is required.", field.replace('_', " ")));
            None
        }
        Some(v) => Some(v),
    }
}

fn record<T>(errors: &mut FieldErrors, field: &str, result: Result<T, String>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(msg) => {
            errors.add(field, msg);
            None
        }
    }
}

fn nullable_text(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

pub fn parse_price(raw: &str) -> Result<Decimal, String> {
    let price = Decimal::from_str(raw.trim()).map_err(|_| "The price field must be a number.".to_string())?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err("The price field must be at least 0.".into());
    }
    let price = price.round_dp(2);
    if price > PRICE_MAX {
        return Err(format!("The price field must not be greater than {PRICE_MAX}."));
    }
    Ok(price)
}

pub fn parse_stock(raw: &str) -> Result<i32, String> {
    let stock: i64 = raw
        .trim()
        .parse()
        .map_err(|_| "The stock field must be an integer.".to_string())?;
    if stock < 0 {
        return Err("The stock field must be at least 0.".into());
    }
    i32::try_from(stock).map_err(|_| format!("The stock field must not be greater than {}.", i32::MAX))
}

/// Parse a form boolean. An empty value counts as not submitted.
pub fn parse_bool(field: &str, raw: &str) -> Result<Option<bool>, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "on" => Ok(Some(true)),
        "0" | "false" | "off" => Ok(Some(false)),
        _ => Err(format!("The {field} field must be true or false.")),
    }
}

/// Response DTO for a product.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "Team jersey")]
    pub name: String,
    pub description: Option<String>,
    /// Decimal price serialized as a string.
    #[schema(value_type = String, example = "39.90")]
    pub price: Decimal,
    #[schema(example = 120)]
    pub stock: i32,
    pub tournament_id: i32,
    /// Blob reference of the primary image.
    #[schema(example = "products/5f0c6a0e-1b7e-4c1e-9a53-7a0d2a1f9b11.png")]
    pub image: Option<String>,
    /// Gallery blob references in display order.
    pub gallery_images: Option<Vec<String>>,
    pub sku: Option<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            stock: p.stock,
            tournament_id: p.tournament_id,
            image: p.image,
            gallery_images: p.gallery_images,
            sku: p.sku,
            weight: p.weight,
            dimensions: p.dimensions,
            is_active: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BookingResponse {
    pub id: i32,
    pub customer_name: String,
    pub quantity: i32,
    #[schema(example = "Confirmed")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            customer_name: b.customer_name,
            quantity: b.quantity,
            status: b.status,
            created_at: b.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductListItem {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub tournament: Option<TournamentResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductListResponse {
    pub data: Vec<ProductListItem>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub tournament: Option<TournamentResponse>,
    pub bookings: Vec<BookingResponse>,
}

/// Data needed to render an edit form.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductEditResponse {
    pub product: ProductResponse,
    pub tournaments: Vec<TournamentResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductMutationResponse {
    #[schema(example = "Product created successfully.")]
    pub message: String,
    pub product: ProductResponse,
}
