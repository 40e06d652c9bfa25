//! Owner-scoped access to recorded scenes.
//!
//! Every single-scene operation looks the record up without an owner
//! filter, then returns the same `NotFound` for "absent" and "owned by
//! someone else" before acting.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use splatforge_core::error::CoreError;
use splatforge_core::scene_name::validate_scene_name;
use splatforge_core::types::DbId;
use splatforge_db::models::scene::{Scene, SceneSummary};
use splatforge_db::SceneStore;

use crate::error::LibraryError;

#[derive(Clone)]
pub struct SceneLibrary {
    scenes: Arc<dyn SceneStore>,
}

fn not_found(id: DbId) -> CoreError {
    CoreError::NotFound { entity: "Scene", id }
}

impl SceneLibrary {
    pub fn new(scenes: Arc<dyn SceneStore>) -> Self {
        Self { scenes }
    }

    /// The owner's scenes, newest first.
    pub async fn list(&self, owner: DbId) -> Result<Vec<SceneSummary>, LibraryError> {
        let scenes = self.scenes.list_by_user(owner).await?;
        Ok(scenes.into_iter().map(SceneSummary::from).collect())
    }

    pub async fn get(&self, owner: DbId, id: DbId) -> Result<SceneSummary, LibraryError> {
        Ok(self.owned(owner, id).await?.into())
    }

    /// Rename a scene. `raw_name` is the untyped `name` field of the
    /// request body.
    pub async fn rename(
        &self,
        owner: DbId,
        id: DbId,
        raw_name: Option<&Value>,
    ) -> Result<SceneSummary, LibraryError> {
        let name = validate_scene_name(raw_name)?;
        self.owned(owner, id).await?;
        let scene = self.scenes.rename(id, &name).await?.ok_or_else(|| not_found(id))?;
        tracing::info!(user_id = owner, scene_id = id, "Scene renamed");
        Ok(scene.into())
    }

    /// Hard-delete a scene record. Stored asset bytes are left in place.
    pub async fn delete(&self, owner: DbId, id: DbId) -> Result<(), LibraryError> {
        self.owned(owner, id).await?;
        if !self.scenes.delete(id).await? {
            return Err(not_found(id).into());
        }
        tracing::info!(user_id = owner, scene_id = id, "Scene deleted");
        Ok(())
    }

    /// Delete every scene the owner has, concurrently.
    ///
    /// Individual failures are logged and skipped; the returned list is
    /// whatever remains afterwards.
    pub async fn delete_all(&self, owner: DbId) -> Result<Vec<SceneSummary>, LibraryError> {
        let scenes = self.scenes.list_by_user(owner).await?;
        let total = scenes.len();

        let results = join_all(scenes.iter().map(|scene| self.delete(owner, scene.id))).await;
        let mut failed = 0;
        for (scene, result) in scenes.iter().zip(results) {
            if let Err(e) = result {
                failed += 1;
                tracing::warn!(user_id = owner, scene_id = scene.id, error = %e, "Failed to delete scene");
            }
        }
        tracing::info!(user_id = owner, total, failed, "Bulk scene delete finished");

        self.list(owner).await
    }

    async fn owned(&self, owner: DbId, id: DbId) -> Result<Scene, LibraryError> {
        match self.scenes.find_by_id(id).await? {
            Some(scene) if scene.user_id == owner => Ok(scene),
            _ => Err(not_found(id).into()),
        }
    }
}
