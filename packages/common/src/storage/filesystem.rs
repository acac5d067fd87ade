use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use super::error::StorageError;
use super::reference::BlobRef;
use super::traits::{BlobStore, BoxReader};

/// Filesystem-backed blob store.
///
/// Blobs are laid out by reference: `{base_path}/{namespace}/{uuid}.{ext}`.
/// Writes land in `{base_path}/.tmp` first and are renamed into place, so a
/// reader never observes a partially written blob.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn blob_path(&self, reference: &BlobRef) -> PathBuf {
        reference
            .as_str()
            .split('/')
            .fold(self.base_path.clone(), |path, segment| path.join(segment))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Move a fully written temp file to its final location.
    async fn commit(&self, temp_path: &Path, reference: &BlobRef) -> Result<(), StorageError> {
        let blob_path = self.blob_path(reference);
        if let Some(parent) = blob_path.parent()
            && let Err(e) = fs::create_dir_all(parent).await
        {
            let _ = fs::remove_file(temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(temp_path, &blob_path).await {
            let _ = fs::remove_file(temp_path).await;
            return Err(e.into());
        }

        debug!(reference = %reference, "stored blob");
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
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

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        self.commit(&temp_path, &reference).await?;
        Ok(reference)
    }

    async fn put_stream(
        &self,
        namespace: &str,
        extension: &str,
        mut reader: BoxReader,
    ) -> Result<BlobRef, StorageError> {
        let reference = BlobRef::generate(namespace, extension)?;
        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024];
        let mut temp_file = fs::File::create(&temp_path).await?;

        let written: Result<(), StorageError> = async {
            loop {
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    break;
                }

                total_bytes += n as u64;
                if total_bytes > self.max_size {
                    return Err(StorageError::SizeLimitExceeded {
                        actual: total_bytes,
                        limit: self.max_size,
                    });
                }

                temp_file.write_all(&buf[..n]).await?;
            }
            temp_file.flush().await?;
            Ok(())
        }
        .await;
        drop(temp_file);

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        self.commit(&temp_path, &reference).await?;
        Ok(reference)
    }

    async fn get_stream(&self, reference: &BlobRef) -> Result<BoxReader, StorageError> {
        let blob_path = self.blob_path(reference);
        match fs::File::open(&blob_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(reference.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, reference: &BlobRef) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.blob_path(reference)).await?)
    }

    async fn delete(&self, reference: &BlobRef) -> Result<bool, StorageError> {
        match fs::remove_file(self.blob_path(reference)).await {
            Ok(()) => {
                debug!(reference = %reference, "deleted blob");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, reference: &BlobRef) -> Result<u64, StorageError> {
        match fs::metadata(self.blob_path(reference)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(reference.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
