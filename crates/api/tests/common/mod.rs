//! Shared harness for API integration tests.
//!
//! Each test app runs the production router over an in-memory store, a
//! temp-dir local asset store, and whatever stub upstreams the test spawns.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::json;
use splatforge_api::auth::identity::IdentityConfig;
use splatforge_api::auth::jwt::{generate_access_token, JwtConfig};
use splatforge_api::billing::{BillingClient, BillingConfig};
use splatforge_api::config::ServerConfig;
use splatforge_api::router::build_app_router;
use splatforge_api::state::AppState;
use splatforge_core::asset_kind::AssetKind;
use splatforge_core::entitlement::QuotaPolicy;
use splatforge_core::types::DbId;
use splatforge_db::memory::MemoryStore;
use splatforge_db::models::scene::{CreateScene, Scene};
use splatforge_db::models::user::{UpsertUser, User};
use splatforge_db::{SceneStore, UserStore};
use splatforge_inference::{build_http_client, AssetFetcher, SplatClient};
use splatforge_pipeline::{Orchestrator, QuotaTracker, SceneLibrary};
use splatforge_storage::{LocalAssetStore, LocalStorageConfig};
use tempfile::TempDir;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const IDENTITY_SECRET: &str = "identity-provider-test-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const ASSETS_BASE_URL: &str = "http://assets.test";

/// Smallest byte string the sniffer accepts as PNG.
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR test image";

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            access_token_expiry_mins: 60,
        },
        identity: IdentityConfig {
            secret: IDENTITY_SECRET.to_string(),
        },
        quota: QuotaPolicy::limited(3),
        billing: None,
    }
}

/// Which optional services the test app has.
#[derive(Default)]
pub struct Services {
    pub splat_url: Option<String>,
    pub billing_api_base: Option<String>,
    pub quota: Option<QuotaPolicy>,
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub config: ServerConfig,
    _assets: TempDir,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Insert a user and mint an access token for them.
    pub async fn user(&self, subject: &str) -> (User, String) {
        let user = self
            .store
            .upsert_from_provider(&UpsertUser {
                provider_subject: subject.to_string(),
                email: format!("{subject}@example.com"),
                name: Some(subject.to_string()),
                avatar_url: None,
            })
            .await
            .unwrap();
        let token = generate_access_token(user.id, &self.config.jwt).unwrap();
        (user, token)
    }

    /// Record a scene directly in the store.
    pub async fn scene(&self, owner: DbId, name: &str) -> Scene {
        self.store
            .create(&CreateScene {
                user_id: owner,
                name: name.to_string(),
                image_url: format!("{ASSETS_BASE_URL}/assets/uploads/{name}.png"),
                model_url: format!("{ASSETS_BASE_URL}/assets/outputs/{name}.ply"),
                model_type: AssetKind::Ply,
            })
            .await
            .unwrap()
    }

    pub async fn stored_user(&self, id: DbId) -> User {
        UserStore::find_by_id(self.store.as_ref(), id)
            .await
            .unwrap()
            .unwrap()
    }
}

/// Build the full application router over in-memory state.
pub async fn build_test_app(services: Services) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());

    let mut config = test_config();
    if let Some(quota) = services.quota {
        config.quota = quota;
    }
    if let Some(api_base) = services.billing_api_base {
        config.billing = Some(BillingConfig {
            secret_key: "sk_test".to_string(),
            price_id: "price_test".to_string(),
            mode: "subscription".to_string(),
            app_url: "https://app.test".to_string(),
            api_base,
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        });
    }

    let http = build_http_client(5).unwrap();
    let assets = Arc::new(LocalAssetStore::new(LocalStorageConfig {
        root: dir.path().to_path_buf(),
        public_base_url: ASSETS_BASE_URL.to_string(),
    }));

    let mut orchestrator = Orchestrator::new(
        QuotaTracker::new(store.clone(), config.quota),
        store.clone(),
        assets,
        AssetFetcher::new(http.clone(), 5),
    );
    if let Some(url) = services.splat_url {
        orchestrator = orchestrator.with_splat(SplatClient::new(http.clone(), url, 5));
    }

    let billing = config
        .billing
        .clone()
        .map(|billing| Arc::new(BillingClient::new(http.clone(), billing)));

    let state = AppState {
        config: Arc::new(config.clone()),
        users: store.clone(),
        orchestrator: Arc::new(orchestrator),
        library: SceneLibrary::new(store.clone()),
        billing,
        local_assets_dir: Some(dir.path().to_path_buf()),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        config,
        _assets: dir,
    }
}

// ---------------------------------------------------------------------------
// Stub upstreams
// ---------------------------------------------------------------------------

/// Serve `app` on an ephemeral port and return its base URL.
pub async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

/// A splat endpoint that answers every call with `status`, counting calls.
///
/// Success bodies carry the PLY bytes `ply` (base64 `cGx5`).
pub async fn stub_splat(status: StatusCode, calls: Arc<AtomicUsize>) -> String {
    let app = Router::new().route(
        "/generate",
        post(move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if status.is_success() {
                    (status, Json(json!({"success": true, "ply_base64": "cGx5"})))
                } else {
                    (status, Json(json!({"detail": "upstream says no"})))
                }
            }
        }),
    );
    format!("{}/generate", spawn_stub(app).await)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", bearer(token))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    json_request(app, Method::POST, uri, None, body).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    json_request(app, Method::POST, uri, Some(token), body).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    json_request(app, Method::PATCH, uri, Some(token), body).await
}

pub async fn delete_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    json_request(app, Method::DELETE, uri, Some(token), body).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header("authorization", bearer(token))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", bearer(token));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    send(app, request).await
}

/// One part of a multipart form.
pub enum Part<'a> {
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

impl<'a> Part<'a> {
    /// The usual `image` field.
    pub fn image(file_name: &'a str, content_type: &'a str, bytes: &'a [u8]) -> Self {
        Part::File {
            name: "image",
            file_name,
            content_type,
            bytes,
        }
    }
}

const BOUNDARY: &str = "splatforge-test-boundary";

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    token: &str,
    parts: &[Part<'_>],
) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", bearer(token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}
