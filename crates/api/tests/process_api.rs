//! HTTP-level tests for the generation endpoints.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    body_bytes, body_json, build_test_app, get, post_json_auth, post_multipart_auth, stub_splat,
    Part, Services, TestApp, ASSETS_BASE_URL, PNG,
};
use serde_json::json;
use splatforge_core::entitlement::QuotaPolicy;
use splatforge_core::upload::MAX_UPLOAD_BYTES;
use splatforge_db::SceneStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn with_splat(status: StatusCode) -> (TestApp, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let url = stub_splat(status, calls.clone()).await;
    let test = build_test_app(Services {
        splat_url: Some(url),
        ..Services::default()
    })
    .await;
    (test, calls)
}

fn png_upload() -> [Part<'static>; 1] {
    [Part::image("chair.png", "image/png", PNG)]
}

// ---------------------------------------------------------------------------
// POST /process
// ---------------------------------------------------------------------------

#[tokio::test]
async fn process_records_a_scene_and_counts_it() {
    let (test, calls) = with_splat(StatusCode::OK).await;
    let (user, token) = test.user("ada").await;

    let response = post_multipart_auth(test.app(), "/api/v1/process", &token, &png_upload()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["modelType"], "ply");
    assert!(json["sceneId"].is_number());
    let model_url = json["modelUrl"].as_str().unwrap();
    let image_url = json["imageUrl"].as_str().unwrap();
    assert!(model_url.starts_with(&format!("{ASSETS_BASE_URL}/assets/outputs/")));
    assert!(model_url.ends_with(".ply"));
    assert!(image_url.starts_with(&format!("{ASSETS_BASE_URL}/assets/uploads/")));
    assert!(image_url.ends_with(".png"));
    assert_eq!(json["usage"]["sceneCount"], 1);
    assert_eq!(json["usage"]["remainingUploads"], 2);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(test.stored_user(user.id).await.scene_count, 1);

    let rows = test.store.list_by_user(user.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(json["sceneId"], rows[0].id);
    assert_eq!(rows[0].model_url, model_url);
    assert_eq!(rows[0].image_url, image_url);
    assert_eq!(rows[0].model_type, "ply");

    let scenes = body_json(common::get_auth(test.app(), "/api/v1/scenes", &token).await).await;
    assert_eq!(scenes["scenes"][0]["id"], json["sceneId"]);
    assert_eq!(scenes["scenes"][0]["name"], "chair");
}

#[tokio::test]
async fn repeated_upload_creates_a_second_scene() {
    let (test, calls) = with_splat(StatusCode::OK).await;
    let (user, token) = test.user("ada").await;

    let first = body_json(
        post_multipart_auth(test.app(), "/api/v1/process", &token, &png_upload()).await,
    )
    .await;
    let second = body_json(
        post_multipart_auth(test.app(), "/api/v1/process", &token, &png_upload()).await,
    )
    .await;

    assert_eq!(first["success"], true);
    assert_eq!(second["success"], true);
    assert_ne!(first["sceneId"], second["sceneId"]);
    assert_ne!(first["modelUrl"], second["modelUrl"]);
    assert_ne!(first["imageUrl"], second["imageUrl"]);
    assert_eq!(second["usage"]["sceneCount"], 2);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(test.store.scene_count(), 2);
    assert_eq!(test.stored_user(user.id).await.scene_count, 2);
}

#[tokio::test]
async fn stored_model_is_served_under_assets() {
    let (test, _calls) = with_splat(StatusCode::OK).await;
    let (_user, token) = test.user("ada").await;

    let json = body_json(
        post_multipart_auth(test.app(), "/api/v1/process", &token, &png_upload()).await,
    )
    .await;
    let path = json["modelUrl"]
        .as_str()
        .unwrap()
        .strip_prefix(ASSETS_BASE_URL)
        .unwrap()
        .to_string();

    let response = get(test.app(), &path).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ply");
}

#[tokio::test]
async fn process_requires_auth() {
    let (test, calls) = with_splat(StatusCode::OK).await;
    let response =
        post_multipart_auth(test.app(), "/api/v1/process", "bogus", &png_upload()).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn exhausted_quota_is_402_without_side_effects() {
    let (test, calls) = with_splat(StatusCode::OK).await;
    let (user, token) = test.user("ada").await;
    test.store.set_counters(user.id, 3, false);

    let response = post_multipart_auth(test.app(), "/api/v1/process", &token, &png_upload()).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Free upload limit reached");
    assert_eq!(json["requiresPayment"], true);
    assert_eq!(json["usage"]["sceneCount"], 3);
    assert_eq!(json["usage"]["canUpload"], false);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(test.store.scene_count(), 0);
}

#[tokio::test]
async fn unlimited_policy_never_blocks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let url = stub_splat(StatusCode::OK, calls.clone()).await;
    let test = build_test_app(Services {
        splat_url: Some(url),
        quota: Some(QuotaPolicy::unlimited()),
        ..Services::default()
    })
    .await;
    let (user, token) = test.user("ada").await;
    test.store.set_counters(user.id, 100, false);

    let response = post_multipart_auth(test.app(), "/api/v1/process", &token, &png_upload()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["usage"]["remainingUploads"].is_null());
}

#[tokio::test]
async fn unreadable_counters_are_503() {
    let (test, calls) = with_splat(StatusCode::OK).await;
    let (_user, token) = test.user("ada").await;
    test.store.fail_user_reads(true);

    let response = post_multipart_auth(test.app(), "/api/v1/process", &token, &png_upload()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error"], "Usage check unavailable");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn text_file_is_rejected_before_upstream() {
    let (test, calls) = with_splat(StatusCode::OK).await;
    let (_user, token) = test.user("ada").await;

    let parts = [Part::image("notes.txt", "text/plain", b"hello")];
    let response = post_multipart_auth(test.app(), "/api/v1/process", &token, &parts).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid request");
    assert!(json["details"].as_str().unwrap().contains("Unsupported file type"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(test.store.scene_count(), 0);
}

#[tokio::test]
async fn missing_image_is_rejected() {
    let (test, calls) = with_splat(StatusCode::OK).await;
    let (_user, token) = test.user("ada").await;

    let parts = [Part::Text {
        name: "note",
        value: "no picture",
    }];
    let response = post_multipart_auth(test.app(), "/api/v1/process", &token, &parts).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["details"], "No image provided");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    let (test, calls) = with_splat(StatusCode::OK).await;
    let (_user, token) = test.user("ada").await;

    let mut big = PNG.to_vec();
    big.resize(MAX_UPLOAD_BYTES + 1, 0);
    let parts = [Part::image("big.png", "image/png", &big)];
    let response = post_multipart_auth(test.app(), "/api/v1/process", &token, &parts).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unconfigured_splat_service_lists_setup_steps() {
    let test = build_test_app(Services::default()).await;
    let (_user, token) = test.user("ada").await;

    let response = post_multipart_auth(test.app(), "/api/v1/process", &token, &png_upload()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Service not configured");
    assert!(!json["setup"].as_array().unwrap().is_empty());
    assert_eq!(test.store.scene_count(), 0);
}

#[tokio::test]
async fn warming_upstream_is_503() {
    let (test, calls) = with_splat(StatusCode::SERVICE_UNAVAILABLE).await;
    let (user, token) = test.user("ada").await;

    let response = post_multipart_auth(test.app(), "/api/v1/process", &token, &png_upload()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(response).await["error"],
        "Model is warming up, please retry in 30-60 seconds"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(test.stored_user(user.id).await.scene_count, 0);
    assert_eq!(test.store.scene_count(), 0);
}

#[tokio::test]
async fn upstream_error_is_502_with_details() {
    let (test, _calls) = with_splat(StatusCode::INTERNAL_SERVER_ERROR).await;
    let (_user, token) = test.user("ada").await;

    let response = post_multipart_auth(test.app(), "/api/v1/process", &token, &png_upload()).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Generation failed");
    assert!(json["details"].as_str().unwrap().contains("upstream says no"));
}

#[tokio::test]
async fn upstream_timeout_is_504() {
    let (test, _calls) = with_splat(StatusCode::GATEWAY_TIMEOUT).await;
    let (_user, token) = test.user("ada").await;

    let response = post_multipart_auth(test.app(), "/api/v1/process", &token, &png_upload()).await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(response).await["error"], "Generation timed out");
}

// ---------------------------------------------------------------------------
// POST /mesh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mesh_rejects_non_numeric_parameters() {
    let test = build_test_app(Services::default()).await;
    let (_user, token) = test.user("ada").await;

    let parts = [
        Part::image("chair.png", "image/png", PNG),
        Part::Text {
            name: "seed",
            value: "lucky",
        },
    ];
    let response = post_multipart_auth(test.app(), "/api/v1/mesh", &token, &parts).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["details"]
        .as_str()
        .unwrap()
        .contains("seed"));
}

#[tokio::test]
async fn unconfigured_mesh_service_is_500() {
    let test = build_test_app(Services::default()).await;
    let (_user, token) = test.user("ada").await;

    let parts = [
        Part::image("chair.png", "image/png", PNG),
        Part::Text {
            name: "textureSize",
            value: "2048",
        },
    ];
    let response = post_multipart_auth(test.app(), "/api/v1/mesh", &token, &parts).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_CONFIGURED");
    assert!(json["details"].as_str().unwrap().contains("Mesh"));
}

// ---------------------------------------------------------------------------
// Image generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blank_prompt_is_rejected() {
    let test = build_test_app(Services::default()).await;
    let (_user, token) = test.user("ada").await;

    let response = post_json_auth(
        test.app(),
        "/api/v1/generate-image",
        &token,
        json!({ "prompt": "   " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn image_generation_is_gated_by_quota() {
    let test = build_test_app(Services::default()).await;
    let (user, token) = test.user("ada").await;
    test.store.set_counters(user.id, 3, false);

    let response = post_json_auth(
        test.app(),
        "/api/v1/generate-image",
        &token,
        json!({ "prompt": "a red chair" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn unconfigured_image_service_is_500() {
    let test = build_test_app(Services::default()).await;
    let (_user, token) = test.user("ada").await;

    let response = post_json_auth(
        test.app(),
        "/api/v1/generate-image",
        &token,
        json!({ "prompt": "a red chair" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Service not configured");
}

#[tokio::test]
async fn edit_image_requires_a_prompt() {
    let test = build_test_app(Services::default()).await;
    let (_user, token) = test.user("ada").await;

    let parts = [Part::image("chair.png", "image/png", PNG)];
    let response = post_multipart_auth(test.app(), "/api/v1/edit-image", &token, &parts).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["details"], "Prompt is required");
}
