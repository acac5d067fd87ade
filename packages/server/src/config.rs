use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use common::storage::object::ObjectStoreConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub log_level: String,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Filesystem,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend.
    pub path: PathBuf,
    /// Hard cap enforced by the blob store itself, in bytes.
    pub max_blob_size: u64,
    pub s3: Option<ObjectStoreConfig>,
}

/// Order of operations when an image field is replaced.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceStrategy {
    /// Delete the old blob, then upload the new one. If the upload fails the
    /// field is left pointing at nothing useful until the next edit.
    #[default]
    DeleteFirst,
    /// Upload the new blob, then delete the old one. A failed upload leaves
    /// the old image in place.
    UploadFirst,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageConfig {
    /// Per-file upload limit in kilobytes.
    pub max_size_kb: u64,
    pub max_gallery_files: usize,
    pub replace_strategy: ReplaceStrategy,
}

impl ImageConfig {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_kb * 1024
    }

    /// Request body limit large enough for a full form submission.
    pub fn body_limit(&self) -> usize {
        let files = self.max_gallery_files as u64 + 1;
        usize::try_from(self.max_size_bytes() * files + 1024 * 1024).unwrap_or(usize::MAX)
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_size_kb: 2048,
            max_gallery_files: 10,
            replace_strategy: ReplaceStrategy::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Default page size for product listings.
    pub per_page: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub images: ImageConfig,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.log_level", "info")?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 20)?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.path", "./storage")?
            .set_default("storage.max_blob_size", 16 * 1024 * 1024)?
            .set_default("images.max_size_kb", 2048)?
            .set_default("images.max_gallery_files", 10)?
            .set_default("images.replace_strategy", "delete_first")?
            .set_default("catalog.per_page", 15)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., STOREFRONT__DATABASE__URL)
            .add_source(Environment::with_prefix("STOREFRONT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
