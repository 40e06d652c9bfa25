//! Generation-service configuration.
//!
//! Each service is optional. A missing service is reported per request as
//! "not configured" together with the setup steps below, so the rest of
//! the API keeps working.

/// Default upstream deadline. The splat model can take minutes on a cold
/// GPU.
pub const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 300;

const DEFAULT_MESH_API_BASE: &str = "https://api.replicate.com/v1";
const DEFAULT_IMAGE_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";

/// Steps shown when the splat endpoint is not configured.
pub const SPLAT_SETUP: &[&str] = &[
    "Deploy the Gaussian-splat inference service",
    "Set SPLAT_ENDPOINT_URL to its generate endpoint",
    "Restart the API server",
];

/// Steps shown when the mesh API is not configured.
pub const MESH_SETUP: &[&str] = &[
    "Create an API token with the mesh prediction provider",
    "Set MESH_API_TOKEN and MESH_MODEL_VERSION",
    "Restart the API server",
];

/// Steps shown when the image API is not configured.
pub const IMAGE_SETUP: &[&str] = &[
    "Create an image generation API key",
    "Set IMAGE_API_KEY (and optionally IMAGE_MODEL)",
    "Restart the API server",
];

#[derive(Debug, Clone)]
pub struct MeshApiConfig {
    pub api_token: String,
    pub model_version: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct ImageApiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub splat_endpoint_url: Option<String>,
    pub mesh: Option<MeshApiConfig>,
    pub image: Option<ImageApiConfig>,
    pub timeout_secs: u64,
}

impl InferenceConfig {
    /// Load generation-service configuration from environment variables.
    ///
    /// | Env Var                  | Default                        |
    /// |--------------------------|--------------------------------|
    /// | `SPLAT_ENDPOINT_URL`     | (unset: splats disabled)       |
    /// | `MESH_API_TOKEN`         | (unset: meshes disabled)       |
    /// | `MESH_MODEL_VERSION`     | (required with the token)      |
    /// | `MESH_API_BASE`          | `https://api.replicate.com/v1` |
    /// | `IMAGE_API_KEY`          | (unset: images disabled)       |
    /// | `IMAGE_MODEL`            | `gpt-image-1`                  |
    /// | `IMAGE_API_BASE`         | `https://api.openai.com/v1`    |
    /// | `INFERENCE_TIMEOUT_SECS` | `300`                          |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let base = |key: &str, default: &str| {
            get(key)
                .unwrap_or_else(|| default.to_string())
                .trim_end_matches('/')
                .to_string()
        };

        let mesh = match (get("MESH_API_TOKEN"), get("MESH_MODEL_VERSION")) {
            (Some(api_token), Some(model_version)) => Some(MeshApiConfig {
                api_token,
                model_version,
                api_base: base("MESH_API_BASE", DEFAULT_MESH_API_BASE),
            }),
            (Some(_), None) => {
                tracing::warn!("MESH_API_TOKEN is set without MESH_MODEL_VERSION; mesh generation disabled");
                None
            }
            _ => None,
        };

        let image = get("IMAGE_API_KEY").map(|api_key| ImageApiConfig {
            api_key,
            model: get("IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.into()),
            api_base: base("IMAGE_API_BASE", DEFAULT_IMAGE_API_BASE),
        });

        let timeout_secs = get("INFERENCE_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_INFERENCE_TIMEOUT_SECS);

        Self {
            splat_endpoint_url: get("SPLAT_ENDPOINT_URL"),
            mesh,
            image,
            timeout_secs,
        }
    }
}
