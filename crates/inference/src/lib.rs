//! HTTP clients for the external generation services.
//!
//! - [`splat::SplatClient`]: photo to Gaussian-splat PLY
//! - [`mesh::MeshClient`]: photo to textured GLB via a predictions API
//! - [`image::ImageClient`]: prompt-driven image generation and editing
//! - [`fetch::AssetFetcher`]: downloads a result URL so it can be re-hosted
//!
//! Every client classifies failures into [`InferenceError`] so callers can
//! map them to a stable response without inspecting upstream text.

pub mod config;
pub mod error;
pub mod fetch;
pub mod image;
pub mod mesh;
pub mod splat;

pub use config::{ImageApiConfig, InferenceConfig, MeshApiConfig};
pub use error::InferenceError;
pub use fetch::AssetFetcher;
pub use image::ImageClient;
pub use mesh::{MeshClient, MeshOutput, MeshParams};
pub use splat::SplatClient;

use std::time::Duration;

/// Build the shared HTTP client used by every generation client.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}
