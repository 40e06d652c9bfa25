//! Handlers for the `/billing` resource (checkout and provider webhooks).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use splatforge_core::billing::{events, verify_signature, SIGNATURE_HEADER};
use splatforge_core::error::CoreError;

use crate::billing::{WebhookEvent, WebhookObject, BILLING_SETUP};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Provider-hosted checkout page.
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

fn not_configured() -> AppError {
    AppError::NotConfigured {
        service: "Billing",
        setup: BILLING_SETUP,
    }
}

/// POST /api/v1/billing/checkout
///
/// Reuses the caller's billing customer, creating and recording one on the
/// first checkout, then opens a checkout session and returns its URL.
pub async fn create_checkout(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<CheckoutResponse>> {
    let billing = state.billing.as_ref().ok_or_else(not_configured)?;

    let user = state
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        })?;

    let customer_id = match user.billing_customer_id {
        Some(id) => id,
        None => {
            let id = billing.create_customer(user.id, &user.email).await?;
            state.users.set_billing_customer(user.id, &id).await?;
            id
        }
    };

    let url = billing.create_checkout_session(&customer_id, user.id).await?;
    Ok(Json(CheckoutResponse { url }))
}

/// POST /api/v1/billing/webhook
///
/// Public, authenticated by the signature header over the raw body.
/// Unknown event types are acknowledged and ignored.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let secret = state
        .billing
        .as_ref()
        .and_then(|b| b.config().webhook_secret.clone())
        .ok_or_else(not_configured)?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing signature header".into()))?;

    verify_signature(signature, &body, &secret, chrono::Utc::now().timestamp()).map_err(|e| {
        tracing::warn!(error = %e, "Rejected billing webhook");
        AppError::BadRequest("Invalid webhook signature".into())
    })?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed webhook event: {e}")))?;

    match event.kind.as_str() {
        events::CHECKOUT_COMPLETED => checkout_completed(&state, &event_object(&event)?).await?,
        events::SUBSCRIPTION_DELETED => {
            subscription_deleted(&state, &event_object(&event)?).await?
        }
        other => tracing::debug!(event = other, "Ignoring billing event"),
    }

    Ok(Json(WebhookAck { received: true }))
}

fn event_object(event: &WebhookEvent) -> AppResult<WebhookObject> {
    event
        .object()
        .map_err(|e| AppError::BadRequest(format!("Malformed {} object: {e}", event.kind)))
}

async fn checkout_completed(state: &AppState, object: &WebhookObject) -> AppResult<()> {
    match (object.user_id(), object.customer.as_deref()) {
        (Some(user_id), customer) => {
            if let Some(customer) = customer {
                state.users.set_billing_customer(user_id, customer).await?;
            }
            if state.users.set_paid(user_id, true).await? {
                tracing::info!(user_id, "User upgraded to paid");
            } else {
                tracing::warn!(user_id, "Checkout completed for unknown user");
            }
        }
        (None, Some(customer)) => {
            if state.users.set_paid_by_customer(customer, true).await? {
                tracing::info!(customer_id = customer, "Customer upgraded to paid");
            } else {
                tracing::warn!(customer_id = customer, "Checkout completed for unknown customer");
            }
        }
        (None, None) => {
            tracing::warn!("Checkout completed event names neither user nor customer");
        }
    }
    Ok(())
}

async fn subscription_deleted(state: &AppState, object: &WebhookObject) -> AppResult<()> {
    let Some(customer) = object.customer.as_deref() else {
        tracing::warn!("Subscription deleted event has no customer");
        return Ok(());
    };
    if state.users.set_paid_by_customer(customer, false).await? {
        tracing::info!(customer_id = customer, "Subscription ended; user downgraded");
    } else {
        tracing::warn!(customer_id = customer, "Subscription deleted for unknown customer");
    }
    Ok(())
}
