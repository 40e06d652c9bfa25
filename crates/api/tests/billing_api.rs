//! HTTP-level tests for checkout and billing webhooks.

mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Form, Json, Router};
use common::{
    body_json, build_test_app, post_json, post_json_auth, spawn_stub, Services, TestApp,
    WEBHOOK_SECRET,
};
use serde_json::{json, Value};
use splatforge_core::billing::signature_header;
use tower::ServiceExt;

type Calls = Arc<Mutex<Vec<(String, HashMap<String, String>)>>>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A billing provider that records every form it receives.
async fn stub_provider(calls: Calls) -> String {
    let customers = calls.clone();
    let sessions = calls;
    let app = Router::new()
        .route(
            "/v1/customers",
            post(move |Form(form): Form<HashMap<String, String>>| {
                let calls = customers.clone();
                async move {
                    calls.lock().unwrap().push(("customers".into(), form));
                    Json(json!({ "id": "cus_test" }))
                }
            }),
        )
        .route(
            "/v1/checkout/sessions",
            post(move |Form(form): Form<HashMap<String, String>>| {
                let calls = sessions.clone();
                async move {
                    calls.lock().unwrap().push(("sessions".into(), form));
                    Json(json!({ "id": "cs_test", "url": "https://checkout.test/cs_test" }))
                }
            }),
        );
    spawn_stub(app).await
}

async fn with_billing() -> (TestApp, Calls) {
    let calls: Calls = Arc::default();
    let base = stub_provider(calls.clone()).await;
    let test = build_test_app(Services {
        billing_api_base: Some(base),
        ..Services::default()
    })
    .await;
    (test, calls)
}

async fn send_webhook(test: &TestApp, event: Value, signature: Option<String>) -> StatusCode {
    let body = event.to_string();
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/billing/webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    let request = builder.body(Body::from(body)).unwrap();
    test.app().oneshot(request).await.unwrap().status()
}

fn sign(event: &Value) -> String {
    signature_header(
        WEBHOOK_SECRET,
        chrono::Utc::now().timestamp(),
        event.to_string().as_bytes(),
    )
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn checkout_without_billing_lists_setup_steps() {
    let test = build_test_app(Services::default()).await;
    let (_user, token) = test.user("ada").await;

    let response = post_json_auth(test.app(), "/api/v1/billing/checkout", &token, json!({})).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Service not configured");
    assert!(json["setup"].is_array());
}

#[tokio::test]
async fn checkout_requires_auth() {
    let (test, calls) = with_billing().await;
    let response = post_json(test.app(), "/api/v1/billing/checkout", json!({})).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn checkout_creates_customer_once_and_returns_url() {
    let (test, calls) = with_billing().await;
    let (user, token) = test.user("ada").await;

    let response = post_json_auth(test.app(), "/api/v1/billing/checkout", &token, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["url"], "https://checkout.test/cs_test");
    assert_eq!(
        test.stored_user(user.id).await.billing_customer_id.as_deref(),
        Some("cus_test")
    );

    let response = post_json_auth(test.app(), "/api/v1/billing/checkout", &token, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let calls = calls.lock().unwrap();
    let kinds: Vec<&str> = calls.iter().map(|(kind, _)| kind.as_str()).collect();
    assert_eq!(kinds, ["customers", "sessions", "sessions"]);

    let (_, customer) = &calls[0];
    assert_eq!(customer["metadata[user_id]"], user.id.to_string());

    let (_, session) = &calls[1];
    assert_eq!(session["customer"], "cus_test");
    assert_eq!(session["mode"], "subscription");
    assert_eq!(session["line_items[0][price]"], "price_test");
    assert_eq!(session["success_url"], "https://app.test/?checkout=success");
    assert_eq!(session["cancel_url"], "https://app.test/?checkout=cancelled");
}

// ---------------------------------------------------------------------------
// Webhooks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn webhook_with_bad_signature_is_400() {
    let (test, _calls) = with_billing().await;
    let event = json!({ "type": "checkout.session.completed", "data": { "object": {} } });

    let forged = signature_header("wrong", chrono::Utc::now().timestamp(), b"{}");
    assert_eq!(send_webhook(&test, event.clone(), Some(forged)).await, StatusCode::BAD_REQUEST);
    assert_eq!(send_webhook(&test, event, None).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn completed_checkout_marks_user_paid() {
    let (test, _calls) = with_billing().await;
    let (user, _token) = test.user("ada").await;

    let event = json!({
        "type": "checkout.session.completed",
        "data": { "object": {
            "customer": "cus_42",
            "client_reference_id": user.id.to_string(),
        }},
    });
    let signature = sign(&event);
    assert_eq!(send_webhook(&test, event, Some(signature)).await, StatusCode::OK);

    let stored = test.stored_user(user.id).await;
    assert!(stored.is_paid);
    assert_eq!(stored.billing_customer_id.as_deref(), Some("cus_42"));
}

#[tokio::test]
async fn deleted_subscription_revokes_paid() {
    let (test, _calls) = with_billing().await;
    let (user, _token) = test.user("ada").await;

    let completed = json!({
        "type": "checkout.session.completed",
        "data": { "object": { "customer": "cus_42", "metadata": { "user_id": user.id.to_string() } } },
    });
    let signature = sign(&completed);
    assert_eq!(send_webhook(&test, completed, Some(signature)).await, StatusCode::OK);
    assert!(test.stored_user(user.id).await.is_paid);

    let deleted = json!({
        "type": "customer.subscription.deleted",
        "data": { "object": { "customer": "cus_42" } },
    });
    let signature = sign(&deleted);
    assert_eq!(send_webhook(&test, deleted, Some(signature)).await, StatusCode::OK);
    assert!(!test.stored_user(user.id).await.is_paid);
}

#[tokio::test]
async fn unknown_events_are_acknowledged() {
    let (test, _calls) = with_billing().await;
    let event = json!({ "type": "invoice.paid", "data": { "object": { "customer": "cus_1" } } });
    let signature = sign(&event);

    assert_eq!(send_webhook(&test, event, Some(signature)).await, StatusCode::OK);
}
