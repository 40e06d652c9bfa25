//! Entitlement reads and the post-generation counter increment.

use std::sync::Arc;

use splatforge_core::entitlement::{Entitlement, QuotaPolicy};
use splatforge_core::types::DbId;
use splatforge_db::UserStore;

use crate::error::GenerationError;

#[derive(Clone)]
pub struct QuotaTracker {
    users: Arc<dyn UserStore>,
    policy: QuotaPolicy,
}

impl QuotaTracker {
    pub fn new(users: Arc<dyn UserStore>, policy: QuotaPolicy) -> Self {
        Self { users, policy }
    }

    pub fn policy(&self) -> QuotaPolicy {
        self.policy
    }

    /// Current entitlement for `user_id`.
    ///
    /// Never fails: a store error or a missing user yields
    /// [`Entitlement::unavailable`], which grants nothing.
    pub async fn snapshot(&self, user_id: DbId) -> Entitlement {
        match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => self.policy.evaluate(user.scene_count, user.is_paid),
            Ok(None) => {
                tracing::warn!(user_id, "Entitlement requested for unknown user");
                Entitlement::unavailable()
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to read usage counters; denying uploads");
                Entitlement::unavailable()
            }
        }
    }

    /// Snapshot if one more generation is allowed, otherwise the reason
    /// it is not.
    pub async fn require_upload(&self, user_id: DbId) -> Result<Entitlement, GenerationError> {
        let usage = self.snapshot(user_id).await;
        match (usage.can_upload, usage.degraded) {
            (true, _) => Ok(usage),
            (false, true) => Err(GenerationError::QuotaUnavailable),
            (false, false) => {
                tracing::info!(user_id, scene_count = usage.scene_count, "Free upload limit reached");
                Err(GenerationError::QuotaExceeded { usage })
            }
        }
    }

    /// Count one finished generation and return the new entitlement.
    ///
    /// Not atomic with the preceding [`require_upload`](Self::require_upload):
    /// two concurrent requests may both pass the check.
    pub async fn increment(&self, user_id: DbId) -> Result<Entitlement, GenerationError> {
        let user = self
            .users
            .increment_scene_count(user_id)
            .await?
            .ok_or_else(|| GenerationError::Internal(format!("user {user_id} disappeared")))?;
        Ok(self.policy.evaluate(user.scene_count, user.is_paid))
    }
}
