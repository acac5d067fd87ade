use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;

use super::{ProductListing, ProductRepository};
use crate::entity::{booking, product, tournament};
use crate::models::product::{Booking, Product, ProductRecord, gallery_to_json};
use crate::models::shared::PageQuery;
use crate::models::tournament::Tournament;

/// SeaORM-backed repository over a pooled connection.
#[derive(Clone)]
pub struct SeaProductRepository {
    db: DatabaseConnection,
}

impl SeaProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for SeaProductRepository {
    async fn list_latest(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductListing>, u64), DbErr> {
        let select = product::Entity::find();

        let total = select
            .clone()
            .paginate(&self.db, per_page)
            .num_items()
            .await?;

        let products = select
            .order_by_desc(product::Column::CreatedAt)
            .order_by_desc(product::Column::Id)
            .offset(Some(PageQuery::offset(page, per_page)))
            .limit(Some(per_page))
            .all(&self.db)
            .await?;

        let mut tournament_ids: Vec<i32> = products.iter().map(|p| p.tournament_id).collect();
        tournament_ids.sort_unstable();
        tournament_ids.dedup();

        let tournaments: HashMap<i32, Tournament> = if tournament_ids.is_empty() {
            HashMap::new()
        } else {
            tournament::Entity::find()
                .filter(tournament::Column::Id.is_in(tournament_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|t| (t.id, Tournament::from(t)))
                .collect()
        };

        let listings = products
            .into_iter()
            .map(|p| ProductListing {
                tournament: tournaments.get(&p.tournament_id).cloned(),
                product: p.into(),
            })
            .collect();

        Ok((listings, total))
    }

    async fn find(&self, id: i32) -> Result<Option<Product>, DbErr> {
        Ok(product::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn bookings_for(&self, product_id: i32) -> Result<Vec<Booking>, DbErr> {
        Ok(booking::Entity::find()
            .filter(booking::Column::ProductId.eq(product_id))
            .order_by_desc(booking::Column::CreatedAt)
            .order_by_desc(booking::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn tournament(&self, id: i32) -> Result<Option<Tournament>, DbErr> {
        Ok(tournament::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn active_tournaments(&self) -> Result<Vec<Tournament>, DbErr> {
        Ok(tournament::Entity::find()
            .filter(tournament::Column::IsActive.eq(true))
            .order_by_asc(tournament::Column::SortOrder)
            .order_by_asc(tournament::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn sku_in_use(&self, sku: &str, except: Option<i32>) -> Result<bool, DbErr> {
        let mut select = product::Entity::find().filter(product::Column::Sku.eq(sku));
        if let Some(id) = except {
            select = select.filter(product::Column::Id.ne(id));
        }
        Ok(select.count(&self.db).await? > 0)
    }

    async fn insert(&self, record: ProductRecord) -> Result<Product, DbErr> {
        let now = Utc::now();
        let model = product::ActiveModel {
            name: Set(record.name),
            description: Set(record.description),
            price: Set(record.price),
            stock: Set(record.stock),
            tournament_id: Set(record.tournament_id),
            image: Set(record.image),
            gallery_images: Set(gallery_to_json(record.gallery_images.as_deref())),
            sku: Set(record.sku),
            weight: Set(record.weight),
            dimensions: Set(record.dimensions),
            is_active: Set(record.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(model.into())
    }

    async fn update(&self, id: i32, record: ProductRecord) -> Result<Product, DbErr> {
        let model = product::ActiveModel {
            id: Unchanged(id),
            name: Set(record.name),
            description: Set(record.description),
            price: Set(record.price),
            stock: Set(record.stock),
            tournament_id: Set(record.tournament_id),
            image: Set(record.image),
            gallery_images: Set(gallery_to_json(record.gallery_images.as_deref())),
            sku: Set(record.sku),
            weight: Set(record.weight),
            dimensions: Set(record.dimensions),
            is_active: Set(record.is_active),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(model.into())
    }

    async fn delete(&self, id: i32) -> Result<(), DbErr> {
        product::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
