//! User entity model and DTOs.

use serde::Serialize;
use splatforge_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    /// Subject claim of the identity provider's ID token.
    #[serde(skip_serializing)]
    pub provider_subject: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub scene_count: i32,
    pub is_paid: bool,
    #[serde(skip_serializing)]
    pub billing_customer_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Profile fields taken from a verified identity token on sign-in.
#[derive(Debug, Clone)]
pub struct UpsertUser {
    pub provider_subject: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}
