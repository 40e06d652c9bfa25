//! Client for the mesh-generation predictions API.
//!
//! A prediction is created with `Prefer: wait`, which returns the finished
//! prediction when the model is fast enough. Otherwise the returned
//! `urls.get` link is polled until the prediction reaches a terminal
//! status or the deadline elapses.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::MeshApiConfig;
use crate::error::{ensure_success, InferenceError};

/// Delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Tunable mesh-generation parameters. Out-of-range values are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeshParams {
    pub seed: u32,
    pub texture_size: u32,
    pub mesh_simplify: f64,
    pub ss_sampling_steps: u32,
    pub slat_sampling_steps: u32,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            seed: 0,
            texture_size: 1024,
            mesh_simplify: 0.95,
            ss_sampling_steps: 12,
            slat_sampling_steps: 12,
        }
    }
}

impl MeshParams {
    pub const TEXTURE_SIZE_RANGE: (u32, u32) = (512, 2048);
    pub const MESH_SIMPLIFY_RANGE: (f64, f64) = (0.9, 0.98);
    pub const SAMPLING_STEPS_RANGE: (u32, u32) = (1, 50);

    pub fn clamped(self) -> Self {
        let (tex_min, tex_max) = Self::TEXTURE_SIZE_RANGE;
        let (simp_min, simp_max) = Self::MESH_SIMPLIFY_RANGE;
        let (steps_min, steps_max) = Self::SAMPLING_STEPS_RANGE;
        let mesh_simplify = if self.mesh_simplify.is_finite() {
            self.mesh_simplify.clamp(simp_min, simp_max)
        } else {
            Self::default().mesh_simplify
        };
        Self {
            seed: self.seed,
            texture_size: self.texture_size.clamp(tex_min, tex_max),
            mesh_simplify,
            ss_sampling_steps: self.ss_sampling_steps.clamp(steps_min, steps_max),
            slat_sampling_steps: self.slat_sampling_steps.clamp(steps_min, steps_max),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: String,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: Option<String>,
    status: String,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    urls: Option<PredictionUrls>,
}

/// Every documented shape of a successful prediction's `output`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MeshOutput {
    /// A single file URL.
    Url(String),
    /// Several file URLs (preview renders plus the model).
    Urls(Vec<String>),
    /// An object naming the model file.
    Named { model_file: String },
}

impl MeshOutput {
    /// Decode `output`, failing closed on anything else.
    pub fn decode(value: serde_json::Value) -> Result<Self, InferenceError> {
        serde_json::from_value(value.clone()).map_err(|_| {
            InferenceError::Decode(format!("unrecognised mesh output shape: {value}"))
        })
    }

    /// URL of the model file: the first `.glb` in a list, else its first
    /// entry.
    pub fn model_url(&self) -> Result<&str, InferenceError> {
        match self {
            Self::Url(url) | Self::Named { model_file: url } => Ok(url),
            Self::Urls(urls) => urls
                .iter()
                .find(|u| is_glb(u))
                .or_else(|| urls.first())
                .map(String::as_str)
                .ok_or_else(|| InferenceError::Decode("mesh output list is empty".into())),
        }
    }
}

fn is_glb(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.to_ascii_lowercase().ends_with(".glb")
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct MeshClient {
    http: reqwest::Client,
    config: MeshApiConfig,
    timeout_secs: u64,
    poll_interval: Duration,
}

impl MeshClient {
    pub fn new(http: reqwest::Client, config: MeshApiConfig, timeout_secs: u64) -> Self {
        Self {
            http,
            config,
            timeout_secs,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Generate a mesh from an image reference (public URL or `data:` URI)
    /// and return the URL of the produced model file.
    pub async fn generate(&self, image: &str, params: MeshParams) -> Result<String, InferenceError> {
        let deadline = Duration::from_secs(self.timeout_secs);
        match tokio::time::timeout(deadline, self.run(image, params.clamped())).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout {
                secs: self.timeout_secs,
            }),
        }
    }

    async fn run(&self, image: &str, params: MeshParams) -> Result<String, InferenceError> {
        let body = serde_json::json!({
            "version": self.config.model_version,
            "input": {
                "image": image,
                "seed": params.seed,
                "texture_size": params.texture_size,
                "mesh_simplify": params.mesh_simplify,
                "ss_sampling_steps": params.ss_sampling_steps,
                "slat_sampling_steps": params.slat_sampling_steps,
                "generate_model": true,
            },
        });

        let response = self
            .http
            .post(format!("{}/predictions", self.config.api_base))
            .bearer_auth(&self.config.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::from_reqwest(e, self.timeout_secs))?;
        let mut prediction: Prediction = self.parse(response).await?;

        tracing::debug!(id = ?prediction.id, status = %prediction.status, "Mesh prediction created");

        loop {
            match prediction.status.as_str() {
                "succeeded" => {
                    let output = prediction.output.ok_or_else(|| {
                        InferenceError::Decode("succeeded prediction has no output".into())
                    })?;
                    let output = MeshOutput::decode(output)?;
                    return output.model_url().map(str::to_string);
                }
                "failed" | "canceled" => {
                    let reason = match prediction.error {
                        Some(serde_json::Value::String(s)) => s,
                        Some(other) => other.to_string(),
                        None => format!("Prediction {}", prediction.status),
                    };
                    return Err(InferenceError::Rejected(reason));
                }
                "starting" | "processing" => {
                    let poll_url = prediction
                        .urls
                        .as_ref()
                        .map(|u| u.get.clone())
                        .ok_or_else(|| {
                            InferenceError::Decode("pending prediction has no poll URL".into())
                        })?;
                    tokio::time::sleep(self.poll_interval).await;
                    prediction = self.poll(&poll_url).await?;
                    tracing::debug!(id = ?prediction.id, status = %prediction.status, "Mesh prediction polled");
                }
                other => {
                    return Err(InferenceError::Decode(format!(
                        "unknown prediction status '{other}'"
                    )))
                }
            }
        }
    }

    async fn poll(&self, url: &str) -> Result<Prediction, InferenceError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(|e| InferenceError::from_reqwest(e, self.timeout_secs))?;
        self.parse(response).await
    }

    async fn parse(&self, response: reqwest::Response) -> Result<Prediction, InferenceError> {
        let response = ensure_success(response, self.timeout_secs).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| InferenceError::from_reqwest(e, self.timeout_secs))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| InferenceError::Decode(format!("prediction is not valid JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn single_url_output() {
        let output = MeshOutput::decode(json!("https://x/model.glb")).unwrap();
        assert_eq!(output.model_url().unwrap(), "https://x/model.glb");
    }

    #[test]
    fn list_output_prefers_glb() {
        let output =
            MeshOutput::decode(json!(["https://x/preview.mp4", "https://x/model.glb?sig=1"])).unwrap();
        assert_eq!(output.model_url().unwrap(), "https://x/model.glb?sig=1");
    }

    #[test]
    fn list_output_without_glb_uses_first() {
        let output = MeshOutput::decode(json!(["https://x/a.obj", "https://x/b.obj"])).unwrap();
        assert_eq!(output.model_url().unwrap(), "https://x/a.obj");
    }

    #[test]
    fn empty_list_is_a_decode_error() {
        let output = MeshOutput::decode(json!([])).unwrap();
        assert_matches!(output.model_url(), Err(InferenceError::Decode(_)));
    }

    #[test]
    fn named_output() {
        let output = MeshOutput::decode(json!({"model_file": "https://x/m.glb", "video": "v"})).unwrap();
        assert_eq!(output.model_url().unwrap(), "https://x/m.glb");
    }

    #[test]
    fn unknown_output_shapes_fail_closed() {
        assert_matches!(MeshOutput::decode(json!(42)), Err(InferenceError::Decode(_)));
        assert_matches!(MeshOutput::decode(json!({"mesh": "x"})), Err(InferenceError::Decode(_)));
        assert_matches!(MeshOutput::decode(json!(null)), Err(InferenceError::Decode(_)));
    }

    #[test]
    fn params_are_clamped() {
        let params = MeshParams {
            seed: 7,
            texture_size: 10_000,
            mesh_simplify: 0.1,
            ss_sampling_steps: 0,
            slat_sampling_steps: 99,
        }
        .clamped();
        assert_eq!(params.seed, 7);
        assert_eq!(params.texture_size, 2048);
        assert_eq!(params.mesh_simplify, 0.9);
        assert_eq!(params.ss_sampling_steps, 1);
        assert_eq!(params.slat_sampling_steps, 50);
    }

    #[test]
    fn non_finite_simplify_falls_back_to_default() {
        let params = MeshParams {
            mesh_simplify: f64::NAN,
            ..MeshParams::default()
        }
        .clamped();
        assert_eq!(params.mesh_simplify, 0.95);
    }
}
