//! Route definitions for generation endpoints.

use axum::routing::post;
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Routes merged at the API root. All require auth.
///
/// ```text
/// POST /process         -> process
/// POST /mesh            -> mesh
/// POST /generate-image  -> generate_image
/// POST /edit-image      -> edit_image
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/process", post(generation::process))
        .route("/mesh", post(generation::mesh))
        .route("/generate-image", post(generation::generate_image))
        .route("/edit-image", post(generation::edit_image))
}
