use std::sync::Arc;

use common::storage::BlobStore;

use crate::config::AppConfig;
use crate::repository::ProductRepository;
use crate::services::product::ProductService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub blob_store: Arc<dyn BlobStore>,
    pub repo: Arc<dyn ProductRepository>,
    pub products: ProductService,
}
