//! Route definitions for the `/scenes` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::scenes;
use crate::state::AppState;

/// Routes mounted at `/scenes`. All require auth.
///
/// ```text
/// GET    /       -> list_scenes
/// DELETE /       -> delete_scenes
/// GET    /{id}   -> get_scene
/// PATCH  /{id}   -> rename_scene
/// DELETE /{id}   -> delete_scene
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(scenes::list_scenes).delete(scenes::delete_scenes))
        .route(
            "/{id}",
            get(scenes::get_scene)
                .patch(scenes::rename_scene)
                .delete(scenes::delete_scene),
        )
}
