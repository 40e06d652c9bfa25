//! End-to-end generation flow.
//!
//! Preconditions are checked before any side effect, in this order:
//! entitlement, input validation, service configuration. Side effects then
//! run strictly in sequence: store input, call the service, store output,
//! record the scene, increment the counter. A failure at any step stops the
//! flow; nothing already written is rolled back and nothing is retried.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use splatforge_core::asset_kind::AssetKind;
use splatforge_core::entitlement::Entitlement;
use splatforge_core::job::{GenerationJob, JobState};
use splatforge_core::scene_name::default_scene_name;
use splatforge_core::storage_key::{StorageKey, StoragePurpose};
use splatforge_core::types::DbId;
use splatforge_core::upload::{validate_image, validate_prompt, ImageFormat};
use splatforge_db::models::scene::{CreateScene, SceneSummary};
use splatforge_db::SceneStore;
use splatforge_inference::config::{IMAGE_SETUP, MESH_SETUP, SPLAT_SETUP};
use splatforge_inference::{
    AssetFetcher, ImageClient, InferenceConfig, MeshClient, MeshParams, SplatClient,
};
use splatforge_storage::{AssetStore, StoredAsset};

use crate::error::GenerationError;
use crate::quota::QuotaTracker;

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// An uploaded image as received from the caller.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Result of a successful 3D generation.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub scene: SceneSummary,
    pub model_type: AssetKind,
    pub usage: Entitlement,
}

/// Result of a successful image generation or edit.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub image_url: String,
}

/// Which 3D service handles a request.
#[derive(Debug, Clone, Copy)]
enum Reconstruction {
    Splat,
    Mesh(MeshParams),
}

impl Reconstruction {
    fn kind(self) -> AssetKind {
        match self {
            Self::Splat => AssetKind::Ply,
            Self::Mesh(_) => AssetKind::Glb,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    quota: QuotaTracker,
    scenes: Arc<dyn SceneStore>,
    assets: Arc<dyn AssetStore>,
    fetcher: AssetFetcher,
    splat: Option<SplatClient>,
    mesh: Option<MeshClient>,
    images: Option<ImageClient>,
}

impl Orchestrator {
    /// An orchestrator with no generation services configured.
    pub fn new(
        quota: QuotaTracker,
        scenes: Arc<dyn SceneStore>,
        assets: Arc<dyn AssetStore>,
        fetcher: AssetFetcher,
    ) -> Self {
        Self {
            quota,
            scenes,
            assets,
            fetcher,
            splat: None,
            mesh: None,
            images: None,
        }
    }

    /// Attach every service that has configuration.
    pub fn with_inference(mut self, config: &InferenceConfig, http: &reqwest::Client) -> Self {
        let timeout = config.timeout_secs;
        if let Some(endpoint) = &config.splat_endpoint_url {
            self.splat = Some(SplatClient::new(http.clone(), endpoint.clone(), timeout));
        }
        if let Some(mesh) = &config.mesh {
            self.mesh = Some(MeshClient::new(http.clone(), mesh.clone(), timeout));
        }
        if let Some(image) = &config.image {
            self.images = Some(ImageClient::new(http.clone(), image.clone(), timeout));
        }
        self
    }

    pub fn with_splat(mut self, client: SplatClient) -> Self {
        self.splat = Some(client);
        self
    }

    pub fn with_mesh(mut self, client: MeshClient) -> Self {
        self.mesh = Some(client);
        self
    }

    pub fn with_images(mut self, client: ImageClient) -> Self {
        self.images = Some(client);
        self
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub fn asset_backend(&self) -> &'static str {
        self.assets.backend()
    }

    // -- 3D generation ------------------------------------------------------

    /// Photo to Gaussian-splat PLY.
    pub async fn process_splat(
        &self,
        user_id: DbId,
        upload: ImageUpload,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.generate(user_id, upload, Reconstruction::Splat).await
    }

    /// Photo to textured GLB mesh.
    pub async fn process_mesh(
        &self,
        user_id: DbId,
        upload: ImageUpload,
        params: MeshParams,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.generate(user_id, upload, Reconstruction::Mesh(params))
            .await
    }

    async fn generate(
        &self,
        user_id: DbId,
        upload: ImageUpload,
        how: Reconstruction,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.quota.require_upload(user_id).await?;
        let format = validate_image(upload.content_type.as_deref(), &upload.bytes)?;
        self.ensure_configured(how)?;

        let kind = how.kind();
        let mut job = GenerationJob::new();
        tracing::info!(user_id, kind = %kind, size = upload.bytes.len(), "Generation started");

        match self.run(user_id, &upload, format, how, &mut job).await {
            Ok(outcome) => {
                advance(&mut job, user_id, JobState::Complete)?;
                tracing::info!(user_id, scene_id = outcome.scene.id, kind = %kind, "Generation complete");
                Ok(outcome)
            }
            Err(e) => {
                let previous = job.state();
                if job.fail(e.to_string()).is_ok() {
                    tracing::warn!(user_id, kind = %kind, from = %previous, error = %e, "Generation failed");
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        user_id: DbId,
        upload: &ImageUpload,
        format: ImageFormat,
        how: Reconstruction,
        job: &mut GenerationJob,
    ) -> Result<GenerationOutcome, GenerationError> {
        let kind = how.kind();

        let input = self
            .store(StoragePurpose::Uploads, format.extension(), upload.bytes.clone(), format.content_type())
            .await?;

        advance(job, user_id, JobState::Processing)?;
        let model_bytes = self.reconstruct(how, upload, format, &input).await?;

        advance(job, user_id, JobState::Generating)?;
        let output = self
            .store(StoragePurpose::Outputs, kind.extension(), model_bytes, kind.content_type())
            .await?;

        let scene = self
            .scenes
            .create(&CreateScene {
                user_id,
                name: default_scene_name(upload.file_name.as_deref()),
                image_url: input.url,
                model_url: output.url,
                model_type: kind,
            })
            .await?;

        let usage = match self.quota.increment(user_id).await {
            Ok(usage) => usage,
            Err(e) => {
                // The scene exists; report success with whatever we can read.
                tracing::error!(user_id, scene_id = scene.id, error = %e, "Failed to increment scene count");
                self.quota.snapshot(user_id).await
            }
        };

        Ok(GenerationOutcome {
            scene: scene.into(),
            model_type: kind,
            usage,
        })
    }

    async fn reconstruct(
        &self,
        how: Reconstruction,
        upload: &ImageUpload,
        format: ImageFormat,
        input: &StoredAsset,
    ) -> Result<Vec<u8>, GenerationError> {
        match how {
            Reconstruction::Splat => {
                let client = self.splat.as_ref().ok_or_else(splat_not_configured)?;
                Ok(client.reconstruct(&upload.bytes).await?)
            }
            Reconstruction::Mesh(params) => {
                let client = self.mesh.as_ref().ok_or_else(mesh_not_configured)?;
                let image_ref = if is_absolute_url(&input.url) {
                    input.url.clone()
                } else {
                    format!(
                        "data:{};base64,{}",
                        format.content_type(),
                        BASE64.encode(&upload.bytes)
                    )
                };
                let model_url = client.generate(&image_ref, params).await?;
                Ok(self.fetcher.fetch(&model_url).await?)
            }
        }
    }

    fn ensure_configured(&self, how: Reconstruction) -> Result<(), GenerationError> {
        match how {
            Reconstruction::Splat if self.splat.is_none() => Err(splat_not_configured()),
            Reconstruction::Mesh(_) if self.mesh.is_none() => Err(mesh_not_configured()),
            _ => Ok(()),
        }
    }

    // -- 2D images ----------------------------------------------------------

    /// Text prompt to PNG. Gated on entitlement but does not consume it.
    pub async fn generate_image(
        &self,
        user_id: DbId,
        prompt: Option<&str>,
    ) -> Result<GeneratedImage, GenerationError> {
        self.quota.require_upload(user_id).await?;
        let prompt = validate_prompt(prompt)?;
        let client = self.images.as_ref().ok_or_else(image_not_configured)?;

        let png = client.generate(&prompt).await?;
        let stored = self
            .store(StoragePurpose::Generated, ImageFormat::Png.extension(), png, ImageFormat::Png.content_type())
            .await?;

        tracing::info!(user_id, key = %stored.key, "Image generated");
        Ok(GeneratedImage {
            image_url: stored.url,
        })
    }

    /// Prompt-driven edit of an uploaded image. Same gating as
    /// [`generate_image`](Self::generate_image).
    pub async fn edit_image(
        &self,
        user_id: DbId,
        upload: ImageUpload,
        prompt: Option<&str>,
    ) -> Result<GeneratedImage, GenerationError> {
        self.quota.require_upload(user_id).await?;
        let format = validate_image(upload.content_type.as_deref(), &upload.bytes)?;
        let prompt = validate_prompt(prompt)?;
        let client = self.images.as_ref().ok_or_else(image_not_configured)?;

        let file_name = upload
            .file_name
            .clone()
            .unwrap_or_else(|| format!("image.{}", format.extension()));
        let png = client
            .edit(upload.bytes, format.content_type(), &file_name, &prompt)
            .await?;
        let stored = self
            .store(StoragePurpose::Edited, ImageFormat::Png.extension(), png, ImageFormat::Png.content_type())
            .await?;

        tracing::info!(user_id, key = %stored.key, "Image edited");
        Ok(GeneratedImage {
            image_url: stored.url,
        })
    }

    // -- helpers ------------------------------------------------------------

    async fn store(
        &self,
        purpose: StoragePurpose,
        extension: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredAsset, GenerationError> {
        let key = StorageKey::generate(purpose, extension);
        Ok(self.assets.put(&key, bytes, content_type).await?)
    }
}

fn advance(job: &mut GenerationJob, user_id: DbId, next: JobState) -> Result<(), GenerationError> {
    let previous = job.advance(next).map_err(|e| GenerationError::Internal(e.to_string()))?;
    tracing::debug!(user_id, from = %previous, to = %next, "Generation job transition");
    Ok(())
}

fn is_absolute_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn splat_not_configured() -> GenerationError {
    GenerationError::NotConfigured {
        service: "Splat generation",
        setup: SPLAT_SETUP,
    }
}

fn mesh_not_configured() -> GenerationError {
    GenerationError::NotConfigured {
        service: "Mesh generation",
        setup: MESH_SETUP,
    }
}

fn image_not_configured() -> GenerationError {
    GenerationError::NotConfigured {
        service: "Image generation",
        setup: IMAGE_SETUP,
    }
}
