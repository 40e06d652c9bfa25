//! Route definitions for the `/auth` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /session  -> create_session
/// GET  /session  -> get_session (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/session",
        post(auth::create_session).get(auth::get_session),
    )
}
