//! Handlers for photo-to-3D generation and 2D image generation.
//!
//! Uploads arrive as `multipart/form-data` with the picture in the `image`
//! field. A missing picture is passed to the orchestrator as an empty
//! upload so that the entitlement check still runs first.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use splatforge_core::asset_kind::AssetKind;
use splatforge_core::entitlement::Entitlement;
use splatforge_core::types::DbId;
use splatforge_inference::MeshParams;
use splatforge_pipeline::{GeneratedImage, GenerationError, GenerationOutcome, ImageUpload};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Successful 3D generation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub success: bool,
    pub model_url: String,
    pub image_url: String,
    pub model_type: AssetKind,
    pub usage: Entitlement,
    pub scene_id: DbId,
}

impl From<GenerationOutcome> for GenerationResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        Self {
            success: true,
            model_url: outcome.scene.model_url,
            image_url: outcome.scene.image_url,
            model_type: outcome.model_type,
            usage: outcome.usage,
            scene_id: outcome.scene.id,
        }
    }
}

/// Successful image generation or edit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub success: bool,
    pub image_url: String,
}

impl From<GeneratedImage> for ImageResponse {
    fn from(image: GeneratedImage) -> Self {
        Self {
            success: true,
            image_url: image.image_url,
        }
    }
}

/// Body of `POST /generate-image`.
#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/process
///
/// Photo to Gaussian-splat PLY.
pub async fn process(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<GenerationResponse>> {
    let form = UploadForm::read(multipart).await?;
    let outcome = state.orchestrator.process_splat(auth.user_id, form.image).await?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/mesh
///
/// Photo to textured GLB. Optional numeric fields: `seed`, `textureSize`,
/// `meshSimplify`, `ssSamplingSteps`, `slatSamplingSteps`. Out-of-range
/// values are clamped by the mesh client.
pub async fn mesh(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<GenerationResponse>> {
    let form = UploadForm::read(multipart).await?;
    let params = form.mesh_params()?;
    let outcome = state
        .orchestrator
        .process_mesh(auth.user_id, form.image, params)
        .await?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/generate-image
///
/// Body: `{ "prompt": "..." }`.
pub async fn generate_image(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<GenerateImageRequest>,
) -> AppResult<Json<ImageResponse>> {
    let image = state
        .orchestrator
        .generate_image(auth.user_id, input.prompt.as_deref())
        .await?;
    Ok(Json(image.into()))
}

/// POST /api/v1/edit-image
///
/// Multipart with `image` and `prompt`.
pub async fn edit_image(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<ImageResponse>> {
    let form = UploadForm::read(multipart).await?;
    let prompt = form.fields.get("prompt").cloned();
    let image = state
        .orchestrator
        .edit_image(auth.user_id, form.image, prompt.as_deref())
        .await?;
    Ok(Json(image.into()))
}

// ---------------------------------------------------------------------------
// Multipart parsing
// ---------------------------------------------------------------------------

struct UploadForm {
    image: ImageUpload,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut image = None;
        let mut fields = HashMap::new();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(malformed)?;
                image = Some(ImageUpload {
                    bytes: bytes.to_vec(),
                    content_type,
                    file_name,
                });
            } else {
                let text = field.text().await.map_err(malformed)?;
                fields.insert(name, text);
            }
        }

        Ok(Self {
            image: image.unwrap_or(ImageUpload {
                bytes: Vec::new(),
                content_type: None,
                file_name: None,
            }),
            fields,
        })
    }

    fn mesh_params(&self) -> AppResult<MeshParams> {
        let defaults = MeshParams::default();
        Ok(MeshParams {
            seed: self.number("seed")?.unwrap_or(defaults.seed),
            texture_size: self.number("textureSize")?.unwrap_or(defaults.texture_size),
            mesh_simplify: self.number("meshSimplify")?.unwrap_or(defaults.mesh_simplify),
            ss_sampling_steps: self
                .number("ssSamplingSteps")?
                .unwrap_or(defaults.ss_sampling_steps),
            slat_sampling_steps: self
                .number("slatSamplingSteps")?
                .unwrap_or(defaults.slat_sampling_steps),
        })
    }

    /// Parse an optional numeric text field. Blank counts as absent.
    fn number<T: FromStr>(&self, name: &str) -> AppResult<Option<T>> {
        match self.fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                AppError::Generation(GenerationError::Validation(format!(
                    "{name} must be a number, got '{raw}'"
                )))
            }),
        }
    }
}

fn malformed(err: MultipartError) -> AppError {
    AppError::Generation(GenerationError::Validation(format!(
        "Malformed upload: {}",
        err.body_text()
    )))
}
