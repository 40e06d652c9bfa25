//! Repository for the `users` table.

use splatforge_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{UpsertUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, provider_subject, email, name, avatar_url, scene_count, \
                       is_paid, billing_customer_id, created_at, updated_at";

/// Provides user lookups and counter updates.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user on first sign-in, or refresh the profile fields of an
    /// existing one. Counters and billing state are left untouched.
    pub async fn upsert_from_provider(
        pool: &PgPool,
        input: &UpsertUser,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (provider_subject, email, name, avatar_url)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (provider_subject) DO UPDATE SET
                email = EXCLUDED.email,
                name = COALESCE(EXCLUDED.name, users.name),
                avatar_url = COALESCE(EXCLUDED.avatar_url, users.avatar_url)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.provider_subject)
            .bind(&input.email)
            .bind(&input.name)
            .bind(&input.avatar_url)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the user linked to a billing-provider customer.
    pub async fn find_by_billing_customer(
        pool: &PgPool,
        customer_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE billing_customer_id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(customer_id)
            .fetch_optional(pool)
            .await
    }

    /// Add one to the generation counter in a single statement.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn increment_scene_count(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET scene_count = scene_count + 1
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Link a billing-provider customer to the user.
    ///
    /// Returns `true` if the row was updated.
    pub async fn set_billing_customer(
        pool: &PgPool,
        id: DbId,
        customer_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET billing_customer_id = $2 WHERE id = $1")
            .bind(id)
            .bind(customer_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the paid flag by user ID.
    pub async fn set_paid(pool: &PgPool, id: DbId, is_paid: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_paid = $2 WHERE id = $1")
            .bind(id)
            .bind(is_paid)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the paid flag for whichever user owns `customer_id`.
    pub async fn set_paid_by_customer(
        pool: &PgPool,
        customer_id: &str,
        is_paid: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_paid = $2 WHERE billing_customer_id = $1")
            .bind(customer_id)
            .bind(is_paid)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
