//! Storage ports used by the pipeline and the API.
//!
//! [`PgStore`] is the production adapter and simply forwards to the
//! repositories. Errors stay as `sqlx::Error` so the API layer can keep
//! classifying constraint violations the same way for every backend.

use async_trait::async_trait;
use splatforge_core::types::DbId;

use crate::models::scene::{CreateScene, Scene};
use crate::models::user::{UpsertUser, User};
use crate::repositories::{SceneRepo, UserRepo};
use crate::DbPool;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn upsert_from_provider(&self, input: &UpsertUser) -> Result<User, sqlx::Error>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, sqlx::Error>;

    async fn find_by_billing_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, sqlx::Error>;

    /// Single-statement `scene_count + 1`; `None` if the user is gone.
    async fn increment_scene_count(&self, id: DbId) -> Result<Option<User>, sqlx::Error>;

    async fn set_billing_customer(&self, id: DbId, customer_id: &str)
        -> Result<bool, sqlx::Error>;

    async fn set_paid(&self, id: DbId, is_paid: bool) -> Result<bool, sqlx::Error>;

    async fn set_paid_by_customer(
        &self,
        customer_id: &str,
        is_paid: bool,
    ) -> Result<bool, sqlx::Error>;

    async fn health_check(&self) -> Result<(), sqlx::Error>;
}

#[async_trait]
pub trait SceneStore: Send + Sync {
    async fn create(&self, input: &CreateScene) -> Result<Scene, sqlx::Error>;

    /// Look up by id with no owner filter.
    async fn find_by_id(&self, id: DbId) -> Result<Option<Scene>, sqlx::Error>;

    /// Newest first.
    async fn list_by_user(&self, user_id: DbId) -> Result<Vec<Scene>, sqlx::Error>;

    async fn rename(&self, id: DbId, name: &str) -> Result<Option<Scene>, sqlx::Error>;

    async fn delete(&self, id: DbId) -> Result<bool, sqlx::Error>;
}

// ---------------------------------------------------------------------------
// PostgreSQL adapter
// ---------------------------------------------------------------------------

/// Both store ports backed by a shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn upsert_from_provider(&self, input: &UpsertUser) -> Result<User, sqlx::Error> {
        UserRepo::upsert_from_provider(&self.pool, input).await
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, sqlx::Error> {
        UserRepo::find_by_id(&self.pool, id).await
    }

    async fn find_by_billing_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        UserRepo::find_by_billing_customer(&self.pool, customer_id).await
    }

    async fn increment_scene_count(&self, id: DbId) -> Result<Option<User>, sqlx::Error> {
        UserRepo::increment_scene_count(&self.pool, id).await
    }

    async fn set_billing_customer(
        &self,
        id: DbId,
        customer_id: &str,
    ) -> Result<bool, sqlx::Error> {
        UserRepo::set_billing_customer(&self.pool, id, customer_id).await
    }

    async fn set_paid(&self, id: DbId, is_paid: bool) -> Result<bool, sqlx::Error> {
        UserRepo::set_paid(&self.pool, id, is_paid).await
    }

    async fn set_paid_by_customer(
        &self,
        customer_id: &str,
        is_paid: bool,
    ) -> Result<bool, sqlx::Error> {
        UserRepo::set_paid_by_customer(&self.pool, customer_id, is_paid).await
    }

    async fn health_check(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }
}

#[async_trait]
impl SceneStore for PgStore {
    async fn create(&self, input: &CreateScene) -> Result<Scene, sqlx::Error> {
        SceneRepo::create(&self.pool, input).await
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Scene>, sqlx::Error> {
        SceneRepo::find_by_id(&self.pool, id).await
    }

    async fn list_by_user(&self, user_id: DbId) -> Result<Vec<Scene>, sqlx::Error> {
        SceneRepo::list_by_user(&self.pool, user_id).await
    }

    async fn rename(&self, id: DbId, name: &str) -> Result<Option<Scene>, sqlx::Error> {
        SceneRepo::rename(&self.pool, id, name).await
    }

    async fn delete(&self, id: DbId) -> Result<bool, sqlx::Error> {
        SceneRepo::delete(&self.pool, id).await
    }
}
