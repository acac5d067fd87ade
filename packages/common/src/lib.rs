pub mod storage;

pub use storage::{BlobRef, BlobStore, StorageError};
