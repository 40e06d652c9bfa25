//! Validation of caller-supplied generation inputs.
//!
//! Images are accepted only when both the declared content type and the
//! sniffed magic bytes agree on one of the whitelisted formats. Prompts are
//! trimmed and length-checked.

use crate::error::CoreError;

/// Largest accepted image upload (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Longest accepted text prompt, in characters.
pub const MAX_PROMPT_CHARS: usize = 1000;

/// Declared content types accepted for image uploads.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

/// An image format this service accepts as generation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }
}

/// Validate an uploaded image and return its sniffed format.
///
/// Checks, in order: declared content type, emptiness, size ceiling, and
/// magic bytes. The sniffed format wins over the declared one when both are
/// allowed but disagree (e.g. a PNG uploaded as `image/jpeg`).
pub fn validate_image(content_type: Option<&str>, bytes: &[u8]) -> Result<ImageFormat, CoreError> {
    if content_type.is_none() && bytes.is_empty() {
        return Err(CoreError::Validation("No image provided".into()));
    }

    let declared = content_type
        .map(normalize_content_type)
        .unwrap_or_default();

    if !ALLOWED_CONTENT_TYPES.contains(&declared.as_str()) {
        return Err(CoreError::Validation(format!(
            "Unsupported file type '{declared}'. Allowed: PNG, JPEG, WebP"
        )));
    }

    if bytes.is_empty() {
        return Err(CoreError::Validation("Uploaded image is empty".into()));
    }

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(format!(
            "Image is {} bytes; the maximum is {MAX_UPLOAD_BYTES} bytes",
            bytes.len()
        )));
    }

    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => Ok(ImageFormat::Png),
        Ok(image::ImageFormat::Jpeg) => Ok(ImageFormat::Jpeg),
        Ok(image::ImageFormat::WebP) => Ok(ImageFormat::Webp),
        _ => Err(CoreError::Validation(
            "File contents are not a PNG, JPEG, or WebP image".into(),
        )),
    }
}

/// Trim a prompt and check it is present and not too long.
pub fn validate_prompt(raw: Option<&str>) -> Result<String, CoreError> {
    let prompt = raw.map(str::trim).unwrap_or_default();
    if prompt.is_empty() {
        return Err(CoreError::Validation("Prompt is required".into()));
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(CoreError::Validation(format!(
            "Prompt must be at most {MAX_PROMPT_CHARS} characters"
        )));
    }
    Ok(prompt.to_string())
}

/// Lowercase a MIME type and drop any `; charset=...` style parameters.
fn normalize_content_type(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
