use axum::body::Bytes;

/// Image formats accepted for product uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

/// Client-side extensions accepted alongside the sniffed format.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

impl ImageFormat {
    /// Detect the format from the leading magic bytes.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        match data {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            _ => None,
        }
    }

    /// Extension used for the stored blob.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }
}

/// A file part received in a multipart form, before validation.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
    /// Index among the request's gallery parts, oversized ones included.
    pub position: Option<usize>,
}

impl UploadedFile {
    /// Browsers submit an empty, unnamed part for an untouched file input.
    pub fn is_blank(&self) -> bool {
        self.data.is_empty() && self.file_name.as_deref().is_none_or(|n| n.trim().is_empty())
    }
}

/// A validated image ready to be handed to the asset manager.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub format: ImageFormat,
    pub data: Bytes,
}

/// Validate an uploaded file as an image of an allowed type and size.
///
/// `field` is the form field name used in the returned message.
pub fn validate_image(file: &UploadedFile, field: &str, max_bytes: u64) -> Result<ImageUpload, String> {
    if file.data.len() as u64 > max_bytes {
        return Err(too_large_message(field, max_bytes));
    }

    if let Some(ext) = file.file_name.as_deref().and_then(client_extension)
        && !ALLOWED_EXTENSIONS.contains(&ext.as_str())
    {
        return Err(mimes_message(field));
    }

    let format = ImageFormat::sniff(&file.data).ok_or_else(|| format!("The {field} field must be an image."))?;

    Ok(ImageUpload {
        format,
        data: file.data.clone(),
    })
}

pub fn too_large_message(field: &str, max_bytes: u64) -> String {
    format!(
        "The {field} field must not be greater than {} kilobytes.",
        max_bytes / 1024
    )
}

fn mimes_message(field: &str) -> String {
    format!(
        "The {field} field must be a file of type: {}.",
        ALLOWED_EXTENSIONS.join(", ")
    )
}

/// Lowercased extension of a client-supplied file name, if any.
fn client_extension(file_name: &str) -> Option<String> {
    let name = file_name.trim().rsplit(['/', '\\']).next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
