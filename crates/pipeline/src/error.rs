use splatforge_core::entitlement::Entitlement;
use splatforge_core::error::CoreError;
use splatforge_inference::InferenceError;
use splatforge_storage::StorageError;

/// Everything that can stop a generation request.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Free upload limit reached")]
    QuotaExceeded { usage: Entitlement },

    /// The user's counters could not be read, so access was denied.
    #[error("Usage check unavailable")]
    QuotaUnavailable,

    #[error("Invalid request: {0}")]
    Validation(String),

    /// The external service needed for this request has no credentials.
    #[error("{service} is not configured")]
    NotConfigured {
        service: &'static str,
        setup: &'static [&'static str],
    },

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for GenerationError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::Validation(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Errors from owner-scoped scene operations.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
