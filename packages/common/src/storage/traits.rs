use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::reference::BlobRef;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Namespaced blob storage.
///
/// Every `put` allocates a new [`BlobRef`]; blobs are never overwritten.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `namespace` and return the new reference.
    async fn put(
        &self,
        namespace: &str,
        extension: &str,
        data: &[u8],
    ) -> Result<BlobRef, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(namespace, extension, reader).await
    }

    /// Store data from an async reader under `namespace`.
    async fn put_stream(
        &self,
        namespace: &str,
        extension: &str,
        reader: BoxReader,
    ) -> Result<BlobRef, StorageError>;

    /// Retrieve all bytes for a blob.
    async fn get(&self, reference: &BlobRef) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(reference).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a blob as a streaming async reader.
    async fn get_stream(&self, reference: &BlobRef) -> Result<BoxReader, StorageError>;

    async fn exists(&self, reference: &BlobRef) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, reference: &BlobRef) -> Result<bool, StorageError>;

    /// Get the size of a blob in bytes.
    async fn size(&self, reference: &BlobRef) -> Result<u64, StorageError>;
}
