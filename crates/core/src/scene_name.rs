//! Scene display-name rules.

use serde_json::Value;

use crate::error::CoreError;

/// Maximum length for a scene name (characters).
pub const MAX_SCENE_NAME_LENGTH: usize = 100;

/// Name used when an upload carries no usable file name.
pub const FALLBACK_SCENE_NAME: &str = "Untitled scene";

/// Validate a rename payload's `name` field.
///
/// The field must be a JSON string; it is trimmed and must then be
/// non-empty and at most [`MAX_SCENE_NAME_LENGTH`] characters.
pub fn validate_scene_name(raw: Option<&Value>) -> Result<String, CoreError> {
    let Some(Value::String(name)) = raw else {
        return Err(CoreError::Validation("Name must be a string".into()));
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("Name must not be empty".into()));
    }
    if name.chars().count() > MAX_SCENE_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Name exceeds maximum length of {MAX_SCENE_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

/// Derive the initial name of a new scene from the uploaded file name.
///
/// Uses the file stem (`chair.png` -> `chair`), truncated to the maximum
/// length, or [`FALLBACK_SCENE_NAME`] when nothing usable remains.
pub fn default_scene_name(file_name: Option<&str>) -> String {
    let stem = file_name
        .map(|f| f.rsplit(['/', '\\']).next().unwrap_or(f))
        .map(|f| f.rsplit_once('.').map_or(f, |(stem, _)| stem))
        .map(str::trim)
        .unwrap_or_default();

    if stem.is_empty() {
        return FALLBACK_SCENE_NAME.to_string();
    }
    stem.chars().take(MAX_SCENE_NAME_LENGTH).collect()
}
