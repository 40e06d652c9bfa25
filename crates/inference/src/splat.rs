//! Client for the Gaussian-splat inference endpoint.
//!
//! Request: `POST <endpoint>` with `{"image": "<base64>"}`.
//! Response (HTTP 200 in both cases):
//! - `{"success": true, "ply_base64": "...", "message": "..."}`
//! - `{"success": false, "error": "..."}`

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use crate::error::{ensure_success, InferenceError};

pub struct SplatClient {
    http: reqwest::Client,
    endpoint: String,
    timeout_secs: u64,
}

/// Raw wire shape; every field optional so the decode step can tell the
/// documented variants apart explicitly.
#[derive(Debug, Deserialize)]
struct RawSplatResponse {
    success: Option<bool>,
    ply_base64: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// The two documented response variants.
#[derive(Debug, PartialEq, Eq)]
pub enum SplatOutcome {
    Generated { ply_base64: String, message: Option<String> },
    Failed { error: String },
}

impl SplatOutcome {
    /// Decode a response body, failing closed on any other shape.
    pub fn decode(body: &[u8]) -> Result<Self, InferenceError> {
        let raw: RawSplatResponse = serde_json::from_slice(body)
            .map_err(|e| InferenceError::Decode(format!("splat response is not JSON: {e}")))?;

        match (raw.success, raw.ply_base64, raw.error) {
            (Some(true), Some(ply_base64), _) if !ply_base64.is_empty() => Ok(Self::Generated {
                ply_base64,
                message: raw.message,
            }),
            (Some(false), _, Some(error)) => Ok(Self::Failed { error }),
            (Some(false), _, None) => Ok(Self::Failed {
                error: "Generation failed without an error message".into(),
            }),
            (Some(true), _, _) => Err(InferenceError::Decode(
                "splat response reported success without ply_base64".into(),
            )),
            (None, _, _) => Err(InferenceError::Decode(
                "splat response has no success flag".into(),
            )),
        }
    }
}

impl SplatClient {
    pub fn new(http: reqwest::Client, endpoint: String, timeout_secs: u64) -> Self {
        Self {
            http,
            endpoint,
            timeout_secs,
        }
    }

    /// Turn an input photo into PLY bytes.
    pub async fn reconstruct(&self, image: &[u8]) -> Result<Vec<u8>, InferenceError> {
        let body = serde_json::json!({ "image": BASE64.encode(image) });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::from_reqwest(e, self.timeout_secs))?;
        let response = ensure_success(response, self.timeout_secs).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| InferenceError::from_reqwest(e, self.timeout_secs))?;

        match SplatOutcome::decode(&bytes)? {
            SplatOutcome::Generated { ply_base64, message } => {
                let ply = BASE64
                    .decode(ply_base64.as_bytes())
                    .map_err(|e| InferenceError::Decode(format!("ply_base64 is not base64: {e}")))?;
                tracing::debug!(size = ply.len(), message = ?message, "Splat generated");
                Ok(ply)
            }
            SplatOutcome::Failed { error } => Err(InferenceError::Rejected(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn decodes_success_variant() {
        let outcome =
            SplatOutcome::decode(br#"{"success":true,"ply_base64":"cGx5","message":"ok"}"#).unwrap();
        assert_eq!(
            outcome,
            SplatOutcome::Generated {
                ply_base64: "cGx5".into(),
                message: Some("ok".into())
            }
        );
    }

    #[test]
    fn decodes_failure_variant() {
        let outcome = SplatOutcome::decode(br#"{"success":false,"error":"bad image"}"#).unwrap();
        assert_eq!(outcome, SplatOutcome::Failed { error: "bad image".into() });
    }

    #[test]
    fn unknown_shapes_fail_closed() {
        assert_matches!(SplatOutcome::decode(b"not json"), Err(InferenceError::Decode(_)));
        assert_matches!(SplatOutcome::decode(br#"{"ply":"x"}"#), Err(InferenceError::Decode(_)));
        assert_matches!(
            SplatOutcome::decode(br#"{"success":true}"#),
            Err(InferenceError::Decode(_))
        );
    }
}
