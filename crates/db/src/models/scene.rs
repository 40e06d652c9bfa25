//! Scene entity model and DTOs.

use serde::Serialize;
use splatforge_core::asset_kind::AssetKind;
use splatforge_core::error::CoreError;
use splatforge_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `scenes` table.
#[derive(Debug, Clone, FromRow)]
pub struct Scene {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub image_url: String,
    pub model_url: String,
    /// One of the [`AssetKind`] tags; enforced by a CHECK constraint.
    pub model_type: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Scene {
    pub fn kind(&self) -> Result<AssetKind, CoreError> {
        self.model_type.parse()
    }
}

/// Caller-facing projection of a scene. Never exposes the owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSummary {
    pub id: DbId,
    pub name: String,
    pub image_url: String,
    pub model_url: String,
    pub model_type: String,
    pub created_at: Timestamp,
}

impl From<Scene> for SceneSummary {
    fn from(scene: Scene) -> Self {
        Self {
            id: scene.id,
            name: scene.name,
            image_url: scene.image_url,
            model_url: scene.model_url,
            model_type: scene.model_type,
            created_at: scene.created_at,
        }
    }
}

/// DTO for recording a finished generation.
#[derive(Debug, Clone)]
pub struct CreateScene {
    pub user_id: DbId,
    pub name: String,
    pub image_url: String,
    pub model_url: String,
    pub model_type: AssetKind,
}
