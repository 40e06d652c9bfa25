//! Failure classification shared by every generation client.

/// Errors from an external generation service.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The service is down or still starting (HTTP 502/503, refused
    /// connection).
    #[error("Upstream unavailable: {detail}")]
    Unavailable { status: Option<u16>, detail: String },

    /// HTTP 504 or the client-side deadline elapsed.
    #[error("Upstream timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The service understood the request and refused it (failed
    /// prediction, content policy, `success: false`).
    #[error("Upstream rejected the request: {0}")]
    Rejected(String),

    /// Any other non-success response or transport failure.
    #[error("Upstream error ({status:?}): {detail}")]
    Upstream { status: Option<u16>, detail: String },

    /// The response did not match any documented shape.
    #[error("Unrecognised upstream response: {0}")]
    Decode(String),
}

impl InferenceError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: String, timeout_secs: u64) -> Self {
        match status {
            502 | 503 => Self::Unavailable {
                status: Some(status),
                detail: body,
            },
            504 => Self::Timeout { secs: timeout_secs },
            _ => Self::Upstream {
                status: Some(status),
                detail: body,
            },
        }
    }

    /// Classify a transport-level `reqwest` failure.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { secs: timeout_secs }
        } else if err.is_connect() {
            Self::Unavailable {
                status: None,
                detail: err.to_string(),
            }
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Upstream {
                status: err.status().map(|s| s.as_u16()),
                detail: err.to_string(),
            }
        }
    }

    /// Upstream-provided text suitable for a `details` field.
    pub fn detail(&self) -> String {
        match self {
            Self::Unavailable { detail, .. } | Self::Upstream { detail, .. } => detail.clone(),
            Self::Rejected(detail) | Self::Decode(detail) => detail.clone(),
            Self::Timeout { secs } => format!("No response within {secs} seconds"),
        }
    }
}

/// Return the response if successful, otherwise a classified error
/// carrying the body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
    timeout_secs: u64,
) -> Result<reqwest::Response, InferenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(InferenceError::from_status(status.as_u16(), body, timeout_secs))
}
