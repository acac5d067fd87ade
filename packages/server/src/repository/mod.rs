mod sea;

pub use sea::SeaProductRepository;

use async_trait::async_trait;
use sea_orm::DbErr;

use crate::models::product::{Booking, Product, ProductRecord};
use crate::models::tournament::Tournament;

/// A product together with the tournament it belongs to.
#[derive(Debug, Clone)]
pub struct ProductListing {
    pub product: Product,
    pub tournament: Option<Tournament>,
}

/// Persistence boundary for products and the records they reference.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// One page of products, newest first, plus the total product count.
    /// `page` is 1-based.
    async fn list_latest(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductListing>, u64), DbErr>;

    async fn find(&self, id: i32) -> Result<Option<Product>, DbErr>;

    async fn bookings_for(&self, product_id: i32) -> Result<Vec<Booking>, DbErr>;

    async fn tournament(&self, id: i32) -> Result<Option<Tournament>, DbErr>;

    /// Active tournaments ordered by `sort_order`, then `id`.
    async fn active_tournaments(&self) -> Result<Vec<Tournament>, DbErr>;

    /// Whether another product (other than `except`) already uses `sku`.
    async fn sku_in_use(&self, sku: &str, except: Option<i32>) -> Result<bool, DbErr>;

    async fn insert(&self, record: ProductRecord) -> Result<Product, DbErr>;

    async fn update(&self, id: i32, record: ProductRecord) -> Result<Product, DbErr>;

    async fn delete(&self, id: i32) -> Result<(), DbErr>;
}
