use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

/// Content type assumed when the client does not say what it sent.
pub const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("an image is required")]
    Missing,
    #[error("invalid base64 image data")]
    InvalidBase64,
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),
}

/// Canonical form of a supported image type.
pub fn supported_image_type(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("image/jpeg"),
        "image/png" => Some("image/png"),
        "image/webp" => Some("image/webp"),
        "image/heic" => Some("image/heic"),
        _ => None,
    }
}

/// Maps a declared content type onto one of the supported image types.
/// Absent or generic types fall back to JPEG.
pub fn normalize_content_type(ct: Option<&str>) -> Result<String, UploadError> {
    let ct = ct
        .map(|c| c.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .unwrap_or_default();
    if ct.is_empty() || ct == "application/octet-stream" {
        return Ok(DEFAULT_IMAGE_TYPE.to_string());
    }
    match supported_image_type(&ct) {
        Some(canonical) => Ok(canonical.to_string()),
        None => Err(UploadError::UnsupportedType(ct)),
    }
}

pub fn build_upload(body: Bytes, content_type: Option<&str>) -> Result<UploadItem, UploadError> {
    if body.is_empty() {
        return Err(UploadError::Missing);
    }
    Ok(UploadItem {
        body,
        content_type: normalize_content_type(content_type)?,
    })
}

/// Accepts raw base64 or a `data:<type>;base64,<payload>` URL. An explicit
/// `content_type` wins over the one embedded in the data URL.
pub fn decode_base64_upload(
    payload: &str,
    content_type: Option<&str>,
) -> Result<UploadItem, UploadError> {
    let payload = payload.trim();
    let (embedded_type, data) = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest.split_once(',').ok_or(UploadError::InvalidBase64)?;
            (meta.strip_suffix(";base64"), data)
        }
        None => (None, payload),
    };
    if data.is_empty() {
        return Err(UploadError::Missing);
    }
    let bytes = BASE64
        .decode(data)
        .map_err(|_| UploadError::InvalidBase64)?;
    build_upload(Bytes::from(bytes), content_type.or(embedded_type))
}

pub fn image_ref(food_id: Uuid) -> String {
    format!("/api/v1/food/{}/image", food_id)
}
