pub mod auth;
pub mod billing;
pub mod generation;
pub mod health;
pub mod scenes;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/session                  sign in (POST, public), session snapshot (GET)
///
/// /process                       photo -> splat PLY (multipart)
/// /mesh                          photo -> GLB mesh (multipart)
/// /generate-image                prompt -> PNG
/// /edit-image                    photo + prompt -> PNG (multipart)
///
/// /scenes                        list, delete one or all
/// /scenes/{id}                   get, rename, delete
///
/// /billing/checkout              open a checkout session
/// /billing/webhook               provider events (public, signed)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Sign-in and session.
        .nest("/auth", auth::router())
        // Generation.
        .merge(generation::router())
        // Scene library.
        .nest("/scenes", scenes::router())
        // Billing.
        .nest("/billing", billing::router())
}
