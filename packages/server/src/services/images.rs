use std::sync::Arc;

use common::storage::{BlobRef, BlobStore, StorageError};
use tracing::{info, instrument, warn};

use crate::config::ReplaceStrategy;
use crate::utils::image::ImageUpload;

/// Namespace for primary product images.
pub const PRODUCT_NAMESPACE: &str = "products";
/// Namespace for product gallery images.
pub const GALLERY_NAMESPACE: &str = "products/gallery";

/// Outcome of replacing stored images.
#[derive(Debug)]
pub struct Replacement<T> {
    pub new: T,
    /// Old references still in the store, to delete after the record update.
    pub stale: Vec<String>,
}

impl<T> Replacement<T> {
    fn new(new: T, stale: Vec<String>) -> Self {
        Self { new, stale }
    }
}

/// Mediates between validated uploads and the blob store.
///
/// Uploads fail loudly; deletes are best-effort and never fail the caller.
#[derive(Clone)]
pub struct ImageAssetManager {
    store: Arc<dyn BlobStore>,
    strategy: ReplaceStrategy,
}

impl ImageAssetManager {
    pub fn new(store: Arc<dyn BlobStore>, strategy: ReplaceStrategy) -> Self {
        Self { store, strategy }
    }

    pub fn store(&self) -> &dyn BlobStore {
        &*self.store
    }

    /// Store an image under a fresh reference in `namespace`.
    #[instrument(skip(self, upload), fields(size = upload.data.len()))]
    pub async fn upload_image(
        &self,
        upload: &ImageUpload,
        namespace: &str,
    ) -> Result<BlobRef, StorageError> {
        let reference = self
            .store
            .put(namespace, upload.format.extension(), &upload.data)
            .await?;
        info!(reference = %reference, "uploaded image");
        Ok(reference)
    }

    /// Remove a stored image. Returns whether a blob was actually removed.
    ///
    /// Missing blobs, malformed references and backend failures are logged
    /// and swallowed.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, reference: &str) -> bool {
        let parsed = match BlobRef::parse(reference) {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping delete of malformed image reference: {e}");
                return false;
            }
        };

        match self.store.delete(&parsed).await {
            Ok(true) => true,
            Ok(false) => {
                warn!("image already missing from store");
                false
            }
            Err(e) => {
                warn!("failed to delete image: {e}");
                false
            }
        }
    }

    /// Delete every reference, in order. Returns how many blobs were removed.
    pub async fn delete_all(&self, references: &[String]) -> usize {
        let mut removed = 0;
        for reference in references {
            if self.delete_image(reference).await {
                removed += 1;
            }
        }
        removed
    }

    /// Upload gallery files in the order given.
    ///
    /// Not transactional: if a later file fails, the blobs stored before it
    /// stay in the store unreferenced.
    pub async fn upload_gallery(
        &self,
        uploads: &[ImageUpload],
    ) -> Result<Vec<BlobRef>, StorageError> {
        let mut references = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.upload_image(upload, GALLERY_NAMESPACE).await {
                Ok(r) => references.push(r),
                Err(e) => {
                    if !references.is_empty() {
                        warn!(
                            orphaned = ?references,
                            "gallery upload aborted; earlier uploads are left unreferenced"
                        );
                    }
                    return Err(e);
                }
            }
        }
        Ok(references)
    }

    /// Replace the primary image, honouring the configured ordering.
    ///
    /// Under `UploadFirst` the old reference is returned in `stale` instead of
    /// being deleted; the caller removes it once the new one is persisted.
    pub async fn replace_primary(
        &self,
        old: Option<&str>,
        upload: &ImageUpload,
    ) -> Result<Replacement<BlobRef>, StorageError> {
        match self.strategy {
            ReplaceStrategy::DeleteFirst => {
                if let Some(old) = old {
                    self.delete_image(old).await;
                }
                let reference = self.upload_image(upload, PRODUCT_NAMESPACE).await?;
                Ok(Replacement::new(reference, Vec::new()))
            }
            ReplaceStrategy::UploadFirst => {
                let reference = self.upload_image(upload, PRODUCT_NAMESPACE).await?;
                Ok(Replacement::new(reference, old.map(str::to_string).into_iter().collect()))
            }
        }
    }

    /// Swap the whole gallery: the new sequence follows upload order and
    /// every old reference is either deleted now or returned as stale.
    pub async fn replace_gallery(
        &self,
        old: &[String],
        uploads: &[ImageUpload],
    ) -> Result<Replacement<Vec<BlobRef>>, StorageError> {
        match self.strategy {
            ReplaceStrategy::DeleteFirst => {
                self.delete_all(old).await;
                let references = self.upload_gallery(uploads).await?;
                Ok(Replacement::new(references, Vec::new()))
            }
            ReplaceStrategy::UploadFirst => {
                let references = self.upload_gallery(uploads).await?;
                Ok(Replacement::new(references, old.to_vec()))
            }
        }
    }

    /// Remove every image owned by a product.
    pub async fn purge(&self, primary: Option<&str>, gallery: &[String]) -> usize {
        let mut removed = 0;
        if let Some(primary) = primary
            && self.delete_image(primary).await
        {
            removed += 1;
        }
        removed + self.delete_all(gallery).await
    }
}
