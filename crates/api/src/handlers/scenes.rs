//! Handlers for the `/scenes` resource.
//!
//! Every route is scoped to the caller. A scene owned by someone else is
//! reported exactly like a missing one.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use splatforge_core::types::DbId;
use splatforge_db::models::scene::SceneSummary;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// `{ scenes: [...] }`
#[derive(Debug, Serialize)]
pub struct ScenesResponse {
    pub scenes: Vec<SceneSummary>,
}

/// `{ scene: {...} }`
#[derive(Debug, Serialize)]
pub struct SceneResponse {
    pub scene: SceneSummary,
}

/// Body of `DELETE /scenes`: one scene, or everything.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteScenesRequest {
    #[serde(default)]
    pub scene_id: Option<DbId>,
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    /// What remains after a bulk delete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenes: Option<Vec<SceneSummary>>,
}

/// GET /api/v1/scenes
pub async fn list_scenes(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ScenesResponse>> {
    let scenes = state.library.list(auth.user_id).await?;
    Ok(Json(ScenesResponse { scenes }))
}

/// GET /api/v1/scenes/{id}
pub async fn get_scene(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<SceneResponse>> {
    let scene = state.library.get(auth.user_id, id).await?;
    Ok(Json(SceneResponse { scene }))
}

/// PATCH /api/v1/scenes/{id}
///
/// Body: `{ "name": "..." }`. The body is taken untyped so that a
/// non-string name is a validation error rather than an extractor
/// rejection.
pub async fn rename_scene(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<Value>,
) -> AppResult<Json<SceneResponse>> {
    let scene = state.library.rename(auth.user_id, id, body.get("name")).await?;
    Ok(Json(SceneResponse { scene }))
}

/// DELETE /api/v1/scenes/{id}
pub async fn delete_scene(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DeleteResponse>> {
    state.library.delete(auth.user_id, id).await?;
    Ok(Json(DeleteResponse {
        success: true,
        scenes: None,
    }))
}

/// DELETE /api/v1/scenes
///
/// Body: `{ "sceneId": 1 }` or `{ "all": true }`.
pub async fn delete_scenes(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<DeleteScenesRequest>,
) -> AppResult<Json<DeleteResponse>> {
    if input.all {
        let remaining = state.library.delete_all(auth.user_id).await?;
        return Ok(Json(DeleteResponse {
            success: true,
            scenes: Some(remaining),
        }));
    }

    let id = input
        .scene_id
        .ok_or_else(|| AppError::BadRequest("Provide sceneId or all: true".into()))?;
    state.library.delete(auth.user_id, id).await?;
    Ok(Json(DeleteResponse {
        success: true,
        scenes: None,
    }))
}
