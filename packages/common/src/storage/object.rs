use std::io::Cursor;

use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::error::StorageError;
use super::reference::BlobRef;
use super::traits::{BlobStore, BoxReader};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct ObjectStoreConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, R2, ...). Uses AWS when absent.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    #[serde(default)]
    pub path_style: bool,
}

/// Blob store backed by an S3-compatible bucket. Object keys equal the
/// blob reference.
pub struct ObjectBlobStore {
    bucket: Box<Bucket>,
    max_size: u64,
}

impl ObjectBlobStore {
    pub fn new(config: &ObjectStoreConfig, max_size: u64) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket, max_size })
    }
}

fn check_status(status: u16, reference: &BlobRef) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(reference.to_string())),
        other => Err(StorageError::Backend(format!(
            "unexpected status {other} for {reference}"
        ))),
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn put(
        &self,
        namespace: &str,
        extension: &str,
        data: &[u8],
    ) -> Result<BlobRef, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let reference = BlobRef::generate(namespace, extension)?;
        let response = self
            .bucket
            .put_object_with_content_type(reference.as_str(), data, &reference.content_type())
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        check_status(response.status_code(), &reference)?;

        debug!(reference = %reference, "stored object");
        Ok(reference)
    }

    async fn put_stream(
        &self,
        namespace: &str,
        extension: &str,
        reader: BoxReader,
    ) -> Result<BlobRef, StorageError> {
        // Images are small; buffer and reuse the size-checked path.
        let mut buf = Vec::new();
        reader.take(self.max_size + 1).read_to_end(&mut buf).await?;
        self.put(namespace, extension, &buf).await
    }

    async fn get_stream(&self, reference: &BlobRef) -> Result<BoxReader, StorageError> {
        let response = self
            .bucket
            .get_object(reference.as_str())
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        check_status(response.status_code(), reference)?;

        Ok(Box::new(Cursor::new(response.bytes().to_vec())))
    }

    async fn exists(&self, reference: &BlobRef) -> Result<bool, StorageError> {
        match self.size(reference).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, reference: &BlobRef) -> Result<bool, StorageError> {
        if !self.exists(reference).await? {
            return Ok(false);
        }
        let response = self
            .bucket
            .delete_object(reference.as_str())
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        check_status(response.status_code(), reference)?;

        debug!(reference = %reference, "deleted object");
        Ok(true)
    }

    async fn size(&self, reference: &BlobRef) -> Result<u64, StorageError> {
        let (head, status) = self
            .bucket
            .head_object(reference.as_str())
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        check_status(status, reference)?;

        Ok(head.content_length.unwrap_or_default().max(0) as u64)
    }
}
