use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use splatforge_core::entitlement::Entitlement;
use splatforge_core::error::CoreError;
use splatforge_inference::InferenceError;
use splatforge_pipeline::{GenerationError, LibraryError};

use crate::billing::BillingError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors, [`GenerationError`] for the
/// generation flow, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `splatforge_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A failed generation or image request.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The billing provider call failed.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// An optional integration needed by this route has no configuration.
    #[error("{service} is not configured")]
    NotConfigured {
        service: &'static str,
        setup: &'static [&'static str],
    },

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::Core(e) => Self::Core(e),
            LibraryError::Database(e) => Self::Database(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Response body
// ---------------------------------------------------------------------------

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// JSON error body. `error` and `code` are always present.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    setup: Option<&'static [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    requires_payment: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<Entitlement>,
}

impl ErrorBody {
    fn new(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
            setup: None,
            requires_payment: None,
            usage: None,
        }
    }

    fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn internal() -> Self {
        Self::new(INTERNAL_MESSAGE, "INTERNAL_ERROR")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => classify_core_error(core),

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- Generation flow ---
            AppError::Generation(err) => classify_generation_error(err),

            // --- Billing ---
            AppError::Billing(err) => {
                tracing::error!(error = %err, "Billing provider error");
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody::new("Billing request failed", "BILLING_ERROR"),
                )
            }

            AppError::NotConfigured { service, setup } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                not_configured(service, *setup),
            ),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(msg.clone(), "BAD_REQUEST"),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, ErrorBody) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            ErrorBody::new(format!("{entity} with id {id} not found"), "NOT_FOUND"),
        ),
        CoreError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("Invalid request", "VALIDATION_ERROR").details(msg.clone()),
        ),
        CoreError::Unauthorized(msg) => (
            StatusCode::UNAUTHORIZED,
            ErrorBody::new("Authentication required", "UNAUTHORIZED").details(msg.clone()),
        ),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
        }
    }
}

/// Map a generation failure to its status and fixed label.
///
/// `details` carries upstream text only; storage, database and internal
/// failures are logged and never described to the caller.
fn classify_generation_error(err: &GenerationError) -> (StatusCode, ErrorBody) {
    match err {
        GenerationError::QuotaExceeded { usage } => {
            let mut body = ErrorBody::new("Free upload limit reached", "QUOTA_EXCEEDED");
            body.requires_payment = Some(true);
            body.usage = Some(usage.clone());
            (StatusCode::PAYMENT_REQUIRED, body)
        }
        GenerationError::QuotaUnavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorBody::new("Usage check unavailable", "QUOTA_UNAVAILABLE"),
        ),
        GenerationError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("Invalid request", "VALIDATION_ERROR").details(msg.clone()),
        ),
        GenerationError::NotConfigured { service, setup } => {
            tracing::error!(service = *service, "Generation service not configured");
            (StatusCode::INTERNAL_SERVER_ERROR, not_configured(service, *setup))
        }
        GenerationError::Inference(inference) => classify_inference_error(inference),
        GenerationError::Storage(storage) => {
            tracing::error!(error = %storage, "Asset storage failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Storage misconfigured", "STORAGE_ERROR"),
            )
        }
        GenerationError::Database(db) => {
            tracing::error!(error = %db, "Database error during generation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Internal error", "INTERNAL_ERROR"),
            )
        }
        GenerationError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal generation error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Internal error", "INTERNAL_ERROR"),
            )
        }
    }
}

fn classify_inference_error(err: &InferenceError) -> (StatusCode, ErrorBody) {
    tracing::warn!(error = %err, "Upstream generation failed");
    let (status, label, code) = match err {
        InferenceError::Unavailable { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Model is warming up, please retry in 30-60 seconds",
            "UPSTREAM_UNAVAILABLE",
        ),
        InferenceError::Timeout { .. } => (
            StatusCode::GATEWAY_TIMEOUT,
            "Generation timed out",
            "UPSTREAM_TIMEOUT",
        ),
        InferenceError::Rejected(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Generation rejected",
            "UPSTREAM_REJECTED",
        ),
        InferenceError::Upstream { .. } | InferenceError::Decode(_) => (
            StatusCode::BAD_GATEWAY,
            "Generation failed",
            "UPSTREAM_ERROR",
        ),
    };
    (status, ErrorBody::new(label, code).details(err.detail()))
}

fn not_configured(service: &str, setup: &'static [&'static str]) -> ErrorBody {
    let mut body = ErrorBody::new("Service not configured", "NOT_CONFIGURED")
        .details(format!("{service} is not configured"));
    body.setup = Some(setup);
    body
}

/// Classify a sqlx error into an HTTP status and body.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, ErrorBody) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            ErrorBody::new("Resource not found", "NOT_FOUND"),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        ErrorBody::new(
                            format!("Duplicate value violates unique constraint: {constraint}"),
                            "CONFLICT",
                        ),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
        }
    }
}
