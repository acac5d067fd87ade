mod error;
mod reference;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod object;

pub use error::StorageError;
pub use reference::{BlobRef, validate_namespace};
pub use traits::{BlobStore, BoxReader};
