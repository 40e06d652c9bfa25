//! Repository for the `scenes` table.
//!
//! Lookups here are not owner-filtered; ownership is checked one layer up
//! so that "absent" and "owned by someone else" look the same to callers.

use splatforge_core::types::DbId;
use sqlx::PgPool;

use crate::models::scene::{CreateScene, Scene};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, name, image_url, model_url, model_type, created_at, updated_at";

/// Provides CRUD operations for scenes.
pub struct SceneRepo;

impl SceneRepo {
    /// Insert a new scene, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateScene) -> Result<Scene, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenes (user_id, name, image_url, model_url, model_type)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.image_url)
            .bind(&input.model_url)
            .bind(input.model_type.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a scene by its internal ID, regardless of owner.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes WHERE id = $1");
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's scenes, newest first.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Scene>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scenes
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Change a scene's display name.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn rename(pool: &PgPool, id: DbId, name: &str) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!("UPDATE scenes SET name = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Hard-delete a scene. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scenes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
