use std::sync::Arc;

use common::storage::BlobRef;
use tracing::{info, instrument, warn};

use crate::config::ImageConfig;
use crate::error::AppError;
use crate::models::product::*;
use crate::models::shared::{FieldErrors, PageQuery, Pagination};
use crate::models::tournament::{Tournament, TournamentResponse};
use crate::repository::ProductRepository;
use crate::services::images::{ImageAssetManager, PRODUCT_NAMESPACE};

pub const CREATED_MESSAGE: &str = "Product created successfully.";
pub const UPDATED_MESSAGE: &str = "Product updated successfully.";
pub const DELETED_MESSAGE: &str = "Product deleted successfully.";

/// Product catalog operations: validation, image lifecycle and persistence.
#[derive(Clone)]
pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
    images: ImageAssetManager,
    limits: ImageConfig,
    per_page: u64,
}

impl ProductService {
    pub fn new(
        repo: Arc<dyn ProductRepository>,
        images: ImageAssetManager,
        limits: ImageConfig,
        per_page: u64,
    ) -> Self {
        Self {
            repo,
            images,
            limits,
            per_page,
        }
    }

    pub fn images(&self) -> &ImageAssetManager {
        &self.images
    }

    #[instrument(skip(self, query))]
    pub async fn list(&self, query: &PageQuery) -> Result<ProductListResponse, AppError> {
        let (page, per_page) = query.resolve(self.per_page);
        let (listings, total) = self.repo.list_latest(page, per_page).await?;

        let data = listings
            .into_iter()
            .map(|l| ProductListItem {
                product: l.product.into(),
                tournament: l.tournament.map(Into::into),
            })
            .collect();

        Ok(ProductListResponse {
            data,
            pagination: Pagination {
                page,
                per_page,
                total,
                total_pages: total.div_ceil(per_page),
            },
        })
    }

    /// Tournaments offered when creating a product.
    pub async fn create_form(&self) -> Result<Vec<Tournament>, AppError> {
        Ok(self.repo.active_tournaments().await?)
    }

    #[instrument(skip(self, form))]
    pub async fn store(&self, form: ProductForm) -> Result<Product, AppError> {
        let input = self.validate(form, None).await?;

        let image = match &input.image {
            Some(upload) => Some(self.images.upload_image(upload, PRODUCT_NAMESPACE).await?),
            None => None,
        };
        let gallery = if input.gallery_images.is_empty() {
            None
        } else {
            match self.images.upload_gallery(&input.gallery_images).await {
                Ok(refs) => Some(refs),
                Err(e) => {
                    warn_orphans(image.iter());
                    return Err(e.into());
                }
            }
        };

        let uploaded: Vec<BlobRef> = image.iter().chain(gallery.iter().flatten()).cloned().collect();
        let record = ProductRecord {
            name: input.name,
            description: input.description.flatten(),
            price: input.price,
            stock: input.stock,
            tournament_id: input.tournament_id,
            image: image.map(String::from),
            gallery_images: gallery.map(|refs| refs.into_iter().map(String::from).collect()),
            sku: input.sku.flatten(),
            weight: input.weight.flatten(),
            dimensions: input.dimensions.flatten(),
            is_active: input.is_active.unwrap_or(true),
        };

        let product = self.repo.insert(record).await.inspect_err(|_| {
            warn_orphans(uploaded.iter());
        })?;
        info!(id = product.id, "product created");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn show(&self, id: i32) -> Result<ProductDetailResponse, AppError> {
        let product = self.find(id).await?;
        let tournament = self.repo.tournament(product.tournament_id).await?;
        let bookings = self.repo.bookings_for(id).await?;

        Ok(ProductDetailResponse {
            product: product.into(),
            tournament: tournament.map(Into::into),
            bookings: bookings.into_iter().map(Into::into).collect(),
        })
    }

    #[instrument(skip(self))]
    pub async fn edit_form(&self, id: i32) -> Result<ProductEditResponse, AppError> {
        let product = self.find(id).await?;
        let tournaments = self.repo.active_tournaments().await?;

        Ok(ProductEditResponse {
            product: product.into(),
            tournaments: tournaments.into_iter().map(TournamentResponse::from).collect(),
        })
    }

    #[instrument(skip(self, form))]
    pub async fn update(&self, id: i32, form: ProductForm) -> Result<Product, AppError> {
        let current = self.find(id).await?;
        let input = self.validate(form, Some(id)).await?;

        let mut record = current.record();
        record.name = input.name;
        record.price = input.price;
        record.stock = input.stock;
        record.tournament_id = input.tournament_id;
        if let Some(description) = input.description {
            record.description = description;
        }
        if let Some(sku) = input.sku {
            record.sku = sku;
        }
        if let Some(weight) = input.weight {
            record.weight = weight;
        }
        if let Some(dimensions) = input.dimensions {
            record.dimensions = dimensions;
        }
        if let Some(is_active) = input.is_active {
            record.is_active = is_active;
        }

        // Old images the new record drops; deleted only after the update commits.
        let mut stale: Vec<String> = Vec::new();
        let mut uploaded = Vec::new();
        if let Some(upload) = &input.image {
            let replaced = self
                .images
                .replace_primary(current.image.as_deref(), upload)
                .await?;
            stale.extend(replaced.stale);
            uploaded.push(replaced.new.clone());
            record.image = Some(replaced.new.into());
        } else if input.remove_image {
            stale.extend(current.image.iter().cloned());
            record.image = None;
        }

        let old_gallery = current.gallery_images.as_deref().unwrap_or_default();
        if !input.gallery_images.is_empty() {
            let replaced = match self
                .images
                .replace_gallery(old_gallery, &input.gallery_images)
                .await
            {
                Ok(replaced) => replaced,
                Err(e) => {
                    warn_orphans(uploaded.iter());
                    return Err(e.into());
                }
            };
            stale.extend(replaced.stale);
            uploaded.extend(replaced.new.iter().cloned());
            record.gallery_images = Some(replaced.new.into_iter().map(String::from).collect());
        } else if input.remove_gallery_images {
            stale.extend(old_gallery.iter().cloned());
            record.gallery_images = None;
        }

        let product = self.repo.update(id, record).await.inspect_err(|_| {
            warn_orphans(uploaded.iter());
        })?;
        let removed = self.images.delete_all(&stale).await;
        info!(images_removed = removed, "product updated");
        Ok(product)
    }

    /// Delete a product and every image it owns.
    ///
    /// Unlike a plain cascade, a product that still has bookings is refused
    /// with 409: `bookings.product_id` references it, and dropping the row
    /// would either fail on the foreign key or erase booking history.
    #[instrument(skip(self))]
    pub async fn destroy(&self, id: i32) -> Result<(), AppError> {
        let product = self.find(id).await?;

        let bookings = self.repo.bookings_for(id).await?;
        if !bookings.is_empty() {
            return Err(AppError::Conflict(format!(
                "Product has {} booking(s) and cannot be deleted.",
                bookings.len()
            )));
        }

        let removed = self
            .images
            .purge(
                product.image.as_deref(),
                product.gallery_images.as_deref().unwrap_or_default(),
            )
            .await;
        self.repo.delete(id).await?;
        info!(images_removed = removed, "product deleted");
        Ok(())
    }

    async fn find(&self, id: i32) -> Result<Product, AppError> {
        self.repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".into()))
    }

    /// Run field rules plus the checks that need the database. Errors from
    /// both are reported together.
    async fn validate(&self, form: ProductForm, except: Option<i32>) -> Result<ProductInput, AppError> {
        let mut db_errors = FieldErrors::default();

        if let Some(tournament_id) = form.requested_tournament().filter(|id| *id > 0)
            && self.repo.tournament(tournament_id).await?.is_none()
        {
            db_errors.add("tournament_id", "The selected tournament id is invalid.");
        }
        if let Some(sku) = form.requested_sku()
            && self.repo.sku_in_use(sku, except).await?
        {
            db_errors.add("sku", "The sku has already been taken.");
        }

        match ProductInput::from_form(form, &self.limits) {
            Ok(input) if db_errors.is_empty() => Ok(input),
            Ok(_) => Err(AppError::InvalidFields(db_errors)),
            Err(mut errors) => {
                errors.merge(db_errors);
                Err(AppError::InvalidFields(errors))
            }
        }
    }
}

fn warn_orphans<'a>(refs: impl Iterator<Item = &'a BlobRef>) {
    let orphaned: Vec<&str> = refs.map(BlobRef::as_str).collect();
    if !orphaned.is_empty() {
        warn!(?orphaned, "request failed after upload; blobs left unreferenced");
    }
}
