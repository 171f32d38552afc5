use std::path::Path;

use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::storage::{LocalPhotoStorage, UploadError};

/// A photo received in a multipart body that passed type validation.
#[derive(Debug)]
pub struct PhotoUpload {
    pub body: Bytes,
    /// Lower-cased extension without the leading dot.
    pub ext: String,
}

lazy_static! {
    static ref IMAGE_EXT_RE: Regex = Regex::new(r"^(jpeg|jpg|png|gif)$").unwrap();
    static ref IMAGE_MIME_RE: Regex = Regex::new(r"^image/(jpeg|jpg|png|gif)$").unwrap();
}

/// Both the extension of `file_name` and the declared content type must be
/// jpeg/jpg/png/gif.
pub fn validate_photo(
    file_name: &str,
    content_type: &str,
    body: Bytes,
) -> Result<PhotoUpload, UploadError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let mime = content_type.trim().to_ascii_lowercase();

    if !IMAGE_EXT_RE.is_match(&ext) || !IMAGE_MIME_RE.is_match(&mime) {
        warn!(file_name, content_type, "rejected non-image upload");
        return Err(UploadError::InvalidType);
    }
    Ok(PhotoUpload { body, ext })
}

/// Stores the photo if one was given. No photo yields an empty path.
pub async fn store_optional_photo(
    storage: &LocalPhotoStorage,
    photo: Option<PhotoUpload>,
) -> Result<String, UploadError> {
    match photo {
        Some(p) => storage.put_photo(p.body, &p.ext).await,
        None => Ok(String::new()),
    }
}
