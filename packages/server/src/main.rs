use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use common::storage::object::ObjectBlobStore;
use tracing::{Level, info};

use server::config::{AppConfig, StorageBackend, StorageConfig};
use server::repository::{ProductRepository, SeaProductRepository};
use server::services::images::ImageAssetManager;
use server::services::product::ProductService;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    let level = Level::from_str(&config.server.log_level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let db = server::database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready");

    let blob_store = init_blob_store(&config.storage).await?;

    let repo: Arc<dyn ProductRepository> = Arc::new(SeaProductRepository::new(db));
    let images = ImageAssetManager::new(blob_store.clone(), config.images.replace_strategy);
    let products = ProductService::new(
        repo.clone(),
        images,
        config.images.clone(),
        config.catalog.per_page,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        config: Arc::new(config),
        blob_store,
        repo,
        products,
    };

    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn init_blob_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Filesystem => {
            let store = FilesystemBlobStore::new(config.path.clone(), config.max_blob_size)
                .await
                .context("Failed to initialize filesystem blob store")?;
            info!(path = %config.path.display(), "Using filesystem blob store");
            Ok(Arc::new(store))
        }
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .context("storage.s3 must be set when storage.backend = \"s3\"")?;
            let store = ObjectBlobStore::new(s3, config.max_blob_size)
                .context("Failed to initialize object blob store")?;
            info!(bucket = %s3.bucket, "Using object blob store");
            Ok(Arc::new(store))
        }
    }
}
