//! In-memory store for tests.
//!
//! Mirrors the PostgreSQL semantics the rest of the workspace relies on:
//! upsert by provider subject, newest-first listing, unfiltered lookups,
//! hard deletes. Failure switches let tests exercise degraded paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use splatforge_core::types::DbId;

use crate::models::scene::{CreateScene, Scene};
use crate::models::user::{UpsertUser, User};
use crate::store::{SceneStore, UserStore};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    scenes: Vec<Scene>,
    next_user_id: DbId,
    next_scene_id: DbId,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_user_reads: AtomicBool,
    fail_scene_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every user lookup fail as if the database were unreachable.
    pub fn fail_user_reads(&self, fail: bool) {
        self.fail_user_reads.store(fail, Ordering::SeqCst);
    }

    /// Make scene inserts, renames and deletes fail.
    pub fn fail_scene_writes(&self, fail: bool) {
        self.fail_scene_writes.store(fail, Ordering::SeqCst);
    }

    /// Overwrite a user's counters directly.
    pub fn set_counters(&self, id: DbId, scene_count: i32, is_paid: bool) {
        let mut tables = self.lock();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.scene_count = scene_count;
            user.is_paid = is_paid;
        }
    }

    pub fn scene_count(&self) -> usize {
        self.lock().scenes.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A panicking test must not poison the store for the others.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_user_reads(&self) -> Result<(), sqlx::Error> {
        if self.fail_user_reads.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }

    fn check_scene_writes(&self) -> Result<(), sqlx::Error> {
        if self.fail_scene_writes.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert_from_provider(&self, input: &UpsertUser) -> Result<User, sqlx::Error> {
        let mut tables = self.lock();
        let now = Utc::now();

        if let Some(user) = tables
            .users
            .iter_mut()
            .find(|u| u.provider_subject == input.provider_subject)
        {
            user.email = input.email.clone();
            if input.name.is_some() {
                user.name = input.name.clone();
            }
            if input.avatar_url.is_some() {
                user.avatar_url = input.avatar_url.clone();
            }
            user.updated_at = now;
            return Ok(user.clone());
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            provider_subject: input.provider_subject.clone(),
            email: input.email.clone(),
            name: input.name.clone(),
            avatar_url: input.avatar_url.clone(),
            scene_count: 0,
            is_paid: false,
            billing_customer_id: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, sqlx::Error> {
        self.check_user_reads()?;
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_billing_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        self.check_user_reads()?;
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.billing_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn increment_scene_count(&self, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let mut tables = self.lock();
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|u| {
            u.scene_count += 1;
            u.updated_at = Utc::now();
            u.clone()
        }))
    }

    async fn set_billing_customer(
        &self,
        id: DbId,
        customer_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tables = self.lock();
        Ok(tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .map(|u| u.billing_customer_id = Some(customer_id.to_string()))
            .is_some())
    }

    async fn set_paid(&self, id: DbId, is_paid: bool) -> Result<bool, sqlx::Error> {
        let mut tables = self.lock();
        Ok(tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .map(|u| u.is_paid = is_paid)
            .is_some())
    }

    async fn set_paid_by_customer(
        &self,
        customer_id: &str,
        is_paid: bool,
    ) -> Result<bool, sqlx::Error> {
        let mut tables = self.lock();
        let mut updated = false;
        for user in tables
            .users
            .iter_mut()
            .filter(|u| u.billing_customer_id.as_deref() == Some(customer_id))
        {
            user.is_paid = is_paid;
            updated = true;
        }
        Ok(updated)
    }

    async fn health_check(&self) -> Result<(), sqlx::Error> {
        self.check_user_reads()
    }
}

#[async_trait]
impl SceneStore for MemoryStore {
    async fn create(&self, input: &CreateScene) -> Result<Scene, sqlx::Error> {
        self.check_scene_writes()?;
        let mut tables = self.lock();
        tables.next_scene_id += 1;
        let now = Utc::now();
        let scene = Scene {
            id: tables.next_scene_id,
            user_id: input.user_id,
            name: input.name.clone(),
            image_url: input.image_url.clone(),
            model_url: input.model_url.clone(),
            model_type: input.model_type.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.scenes.push(scene.clone());
        Ok(scene)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Scene>, sqlx::Error> {
        Ok(self.lock().scenes.iter().find(|s| s.id == id).cloned())
    }

    async fn list_by_user(&self, user_id: DbId) -> Result<Vec<Scene>, sqlx::Error> {
        let mut scenes: Vec<Scene> = self
            .lock()
            .scenes
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        scenes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(scenes)
    }

    async fn rename(&self, id: DbId, name: &str) -> Result<Option<Scene>, sqlx::Error> {
        self.check_scene_writes()?;
        let mut tables = self.lock();
        Ok(tables.scenes.iter_mut().find(|s| s.id == id).map(|s| {
            s.name = name.to_string();
            s.updated_at = Utc::now();
            s.clone()
        }))
    }

    async fn delete(&self, id: DbId) -> Result<bool, sqlx::Error> {
        self.check_scene_writes()?;
        let mut tables = self.lock();
        let before = tables.scenes.len();
        tables.scenes.retain(|s| s.id != id);
        Ok(tables.scenes.len() < before)
    }
}
