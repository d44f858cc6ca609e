//! Images assigned to boxes by drop or by URL.

use base64::{engine::general_purpose, Engine as _};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MediaError {
    #[error("not an image: {0}")]
    NotAnImage(String),
    #[error("malformed data URL: {0}")]
    MalformedDataUrl(String),
    #[error("unsupported image reference: {0}")]
    Unsupported(String),
}

/// A dropped file: its declared media type and raw bytes.
#[derive(Debug, Clone)]
pub struct DroppedFile {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Encode a dropped image as a `data:` URL the grid can store inline.
pub fn data_url_from_file(file: &DroppedFile) -> Result<String, MediaError> {
    if !file.media_type.starts_with("image/") {
        return Err(MediaError::NotAnImage(file.media_type.clone()));
    }
    Ok(format!(
        "data:{};base64,{}",
        file.media_type,
        general_purpose::STANDARD.encode(&file.bytes)
    ))
}

/// Validate an image reference: an http(s) URL or a base64 `data:image/*` URL.
pub fn validate_image_ref(reference: &str) -> Result<String, MediaError> {
    let reference = reference.trim();
    if reference.starts_with("https://") || reference.starts_with("http://") {
        return Ok(reference.to_string());
    }

    let Some(rest) = reference.strip_prefix("data:") else {
        return Err(MediaError::Unsupported(truncate(reference)));
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return Err(MediaError::MalformedDataUrl(truncate(reference)));
    };
    let Some(media_type) = header.strip_suffix(";base64") else {
        return Err(MediaError::MalformedDataUrl(truncate(reference)));
    };
    if !media_type.starts_with("image/") {
        return Err(MediaError::NotAnImage(media_type.to_string()));
    }
    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| MediaError::MalformedDataUrl(e.to_string()))?;
    Ok(reference.to_string())
}

fn truncate(s: &str) -> String {
    s.chars().take(48).collect()
}
