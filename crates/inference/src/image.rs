//! Client for the generative-image API (generation and prompt edits).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use crate::config::ImageApiConfig;
use crate::error::InferenceError;

/// Error codes the API uses for policy refusals.
const POLICY_ERROR_CODES: &[&str] = &["content_policy_violation", "moderation_blocked"];

const IMAGE_SIZE: &str = "1024x1024";

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct ImageClient {
    http: reqwest::Client,
    config: ImageApiConfig,
    timeout_secs: u64,
}

impl ImageClient {
    pub fn new(http: reqwest::Client, config: ImageApiConfig, timeout_secs: u64) -> Self {
        Self {
            http,
            config,
            timeout_secs,
        }
    }

    /// Generate a square PNG from a text prompt.
    pub async fn generate(&self, prompt: &str) -> Result<Vec<u8>, InferenceError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "size": IMAGE_SIZE,
            "n": 1,
        });

        let response = self
            .http
            .post(format!("{}/images/generations", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::from_reqwest(e, self.timeout_secs))?;

        self.decode_image(response).await
    }

    /// Apply a prompt-driven edit to an uploaded image.
    pub async fn edit(
        &self,
        image: Vec<u8>,
        content_type: &str,
        file_name: &str,
        prompt: &str,
    ) -> Result<Vec<u8>, InferenceError> {
        let part = reqwest::multipart::Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| InferenceError::Upstream {
                status: None,
                detail: format!("invalid image content type: {e}"),
            })?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.config.model.clone())
            .text("prompt", prompt.to_string())
            .part("image", part);

        let response = self
            .http
            .post(format!("{}/images/edits", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| InferenceError::from_reqwest(e, self.timeout_secs))?;

        self.decode_image(response).await
    }

    async fn decode_image(&self, response: reqwest::Response) -> Result<Vec<u8>, InferenceError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| InferenceError::from_reqwest(e, self.timeout_secs))?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &bytes, self.timeout_secs));
        }

        let parsed: ImagesResponse = serde_json::from_slice(&bytes)
            .map_err(|e| InferenceError::Decode(format!("image response is not valid JSON: {e}")))?;
        let encoded = parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| InferenceError::Decode("image response has no b64_json data".into()))?;

        BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| InferenceError::Decode(format!("b64_json is not base64: {e}")))
    }
}

/// Policy refusals become `Rejected`; everything else follows the shared
/// status classification.
fn classify_error(status: u16, body: &[u8], timeout_secs: u64) -> InferenceError {
    let envelope = serde_json::from_slice::<ErrorEnvelope>(body).ok();
    if status == 400 {
        if let Some(ErrorEnvelope { error }) = &envelope {
            if error
                .code
                .as_deref()
                .is_some_and(|code| POLICY_ERROR_CODES.contains(&code))
            {
                return InferenceError::Rejected(
                    error
                        .message
                        .clone()
                        .unwrap_or_else(|| "Prompt rejected by content policy".into()),
                );
            }
        }
    }
    let detail = envelope
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
    InferenceError::from_status(status, detail, timeout_secs)
}
