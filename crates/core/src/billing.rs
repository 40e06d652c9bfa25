//! Billing webhook signature verification.
//!
//! The billing provider signs each webhook delivery with a header of the
//! form `t=<unix-seconds>,v1=<hex hmac>[,v1=...]`. The HMAC-SHA256 is taken
//! over `"<t>.<raw body>"` with the endpoint's signing secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Signatures older (or newer) than this many seconds are rejected.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Name of the header carrying the signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Webhook event types this service acts on.
pub mod events {
    pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
    pub const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";
}

/// Checkout modes accepted by the billing provider.
pub const VALID_CHECKOUT_MODES: &[&str] = &["subscription", "payment"];

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

type HmacSha256 = Hmac<Sha256>;

fn signed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Compute the hex `v1` signature for a payload at `timestamp`.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    hex::encode(signed_mac(secret, timestamp, payload).finalize().into_bytes())
}

/// Build a complete signature header value, as the provider would send it.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    format!("t={timestamp},v1={}", compute_signature(secret, timestamp, payload))
}

/// Verify a signature header against the raw request body.
///
/// Succeeds if any `v1` entry matches and the timestamp is within
/// [`SIGNATURE_TOLERANCE_SECS`] of `now`. Comparison is constant-time.
pub fn verify_signature(
    header: &str,
    payload: &[u8],
    secret: &str,
    now: i64,
) -> Result<(), CoreError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| CoreError::Unauthorized("Signature header has no timestamp".into()))?;
    if candidates.is_empty() {
        return Err(CoreError::Unauthorized("Signature header has no v1 entry".into()));
    }
    if now.abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(CoreError::Unauthorized(
            "Signature timestamp outside tolerance".into(),
        ));
    }

    let matched = candidates.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| signed_mac(secret, timestamp, payload).verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(CoreError::Unauthorized("Signature mismatch".into()))
    }
}

/// Validate a configured checkout mode.
pub fn validate_checkout_mode(mode: &str) -> Result<(), CoreError> {
    if VALID_CHECKOUT_MODES.contains(&mode) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid checkout mode '{mode}'. Must be one of: {VALID_CHECKOUT_MODES:?}"
        )))
    }
}
