use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StorageError;

const MAX_REFERENCE_LEN: usize = 512;

/// A validated reference to a stored blob.
///
/// References have the form `{namespace}/{name}.{ext}` where the namespace is
/// one or more `/`-separated segments of `[a-z0-9_-]`. The reference doubles
/// as the relative storage path (filesystem) or object key (S3).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlobRef(String);

impl BlobRef {
    /// Generate a fresh reference under `namespace` with a random UUID name.
    pub fn generate(namespace: &str, extension: &str) -> Result<Self, StorageError> {
        validate_namespace(namespace)?;
        validate_extension(extension)?;
        Ok(Self(format!("{namespace}/{}.{extension}", Uuid::new_v4())))
    }

    /// Parse and validate a reference string previously issued by a store.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.is_empty() {
            return Err(StorageError::InvalidReference("reference is empty".into()));
        }
        if s.len() > MAX_REFERENCE_LEN {
            return Err(StorageError::InvalidReference(format!(
                "reference exceeds {MAX_REFERENCE_LEN} characters"
            )));
        }

        let (namespace, file_name) = s.rsplit_once('/').ok_or_else(|| {
            StorageError::InvalidReference(format!("{s}: missing namespace"))
        })?;
        validate_namespace(namespace)?;
        validate_file_name(file_name)?;

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace portion, e.g. `products/gallery`.
    pub fn namespace(&self) -> &str {
        self.0.rsplit_once('/').map(|(ns, _)| ns).unwrap_or_default()
    }

    /// The final path segment, e.g. `0b9d...e1.png`.
    pub fn file_name(&self) -> &str {
        self.0
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.0)
    }

    pub fn extension(&self) -> Option<&str> {
        self.file_name().rsplit_once('.').map(|(_, ext)| ext)
    }

    /// MIME type implied by the extension, `application/octet-stream` when
    /// unknown.
    pub fn content_type(&self) -> String {
        mime_guess::from_path(self.file_name())
            .first_or_octet_stream()
            .to_string()
    }
}

/// Validate a namespace such as `products` or `products/gallery`.
pub fn validate_namespace(namespace: &str) -> Result<(), StorageError> {
    if namespace.is_empty() {
        return Err(StorageError::InvalidReference("namespace is empty".into()));
    }
    for segment in namespace.split('/') {
        if segment.is_empty() {
            return Err(StorageError::InvalidReference(format!(
                "{namespace}: empty namespace segment"
            )));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_'))
        {
            return Err(StorageError::InvalidReference(format!(
                "{namespace}: namespace segments allow only a-z, 0-9, '-' and '_'"
            )));
        }
    }
    Ok(())
}

fn validate_extension(extension: &str) -> Result<(), StorageError> {
    if extension.is_empty()
        || extension.len() > 8
        || !extension
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(StorageError::InvalidReference(format!(
            "invalid extension: {extension:?}"
        )));
    }
    Ok(())
}

fn validate_file_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidReference("file name is empty".into()));
    }
    if name.starts_with('.') {
        return Err(StorageError::InvalidReference(format!(
            "{name}: file name must not start with '.'"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(StorageError::InvalidReference(format!(
            "{name}: file name contains invalid characters"
        )));
    }
    Ok(())
}

impl AsRef<str> for BlobRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for BlobRef {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<BlobRef> for String {
    fn from(r: BlobRef) -> Self {
        r.0
    }
}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobRef({})", self.0)
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for BlobRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BlobRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
