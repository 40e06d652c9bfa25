//! Route definitions for the `/billing` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::billing;
use crate::state::AppState;

/// Routes mounted at `/billing`.
///
/// ```text
/// POST /checkout  -> create_checkout (requires auth)
/// POST /webhook   -> webhook (signature-verified)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(billing::create_checkout))
        .route("/webhook", post(billing::webhook))
}
