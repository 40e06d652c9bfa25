//! Handlers for the `/auth` resource (sign-in and session snapshot).

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use splatforge_core::entitlement::Entitlement;
use splatforge_core::error::CoreError;
use splatforge_core::types::DbId;
use splatforge_db::models::user::{UpsertUser, User};

use crate::auth::identity::verify_id_token;
use crate::auth::jwt::generate_access_token;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/session`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Successful sign-in response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
    pub usage: Entitlement,
}

/// Session read for an already signed-in caller.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    /// `null` when the user record could not be read.
    pub user: Option<UserInfo>,
    pub usage: Entitlement,
}

/// Public user info.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: DbId,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_paid: bool,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            is_paid: user.is_paid,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/session
///
/// Exchange an identity-provider ID token for an access token. Creates the
/// user on first sign-in and refreshes profile fields afterwards.
pub async fn create_session(
    State(state): State<AppState>,
    Json(input): Json<SessionRequest>,
) -> AppResult<Json<SessionResponse>> {
    let id_token = input
        .id_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| CoreError::Validation("idToken is required".into()))?;

    let claims = verify_id_token(&id_token, &state.config.identity).map_err(|e| {
        tracing::info!(error = %e, "Rejected identity token");
        AppError::Core(CoreError::Unauthorized("Invalid identity token".into()))
    })?;

    if claims.sub.trim().is_empty() || claims.email.trim().is_empty() {
        return Err(CoreError::Unauthorized("Identity token lacks subject or email".into()).into());
    }

    let user = state
        .users
        .upsert_from_provider(&UpsertUser {
            provider_subject: claims.sub,
            email: claims.email,
            name: claims.name,
            avatar_url: claims.picture,
        })
        .await?;

    let access_token = generate_access_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    let usage = state.orchestrator.quota().snapshot(user.id).await;
    tracing::info!(user_id = user.id, "User signed in");

    Ok(Json(SessionResponse {
        access_token,
        expires_in: state.config.jwt.expires_in_secs(),
        user: user.into(),
        usage,
    }))
}

/// GET /api/v1/auth/session
///
/// Current user and entitlement. Never fails once authenticated: an
/// unreadable user record yields `user: null` and a usage snapshot that
/// grants nothing.
pub async fn get_session(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Json<SessionSnapshot> {
    let user = match state.users.find_by_id(auth.user_id).await {
        Ok(user) => user.map(UserInfo::from),
        Err(e) => {
            tracing::warn!(user_id = auth.user_id, error = %e, "Failed to read user for session");
            None
        }
    };
    let usage = state.orchestrator.quota().snapshot(auth.user_id).await;

    Json(SessionSnapshot { user, usage })
}
