use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub stock: i32,

    pub tournament_id: i32,
    #[sea_orm(belongs_to, from = "tournament_id", to = "id")]
    pub tournament: HasOne<super::tournament::Entity>,

    /// Blob reference of the primary image.
    pub image: Option<String>,
    /// Ordered JSON array of gallery blob references.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub gallery_images: Option<Json>,

    #[sea_orm(unique)]
    pub sku: Option<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    pub is_active: bool,

    #[sea_orm(has_many)]
    pub bookings: HasMany<super::booking::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
