use std::net::SocketAddr;
use std::sync::Arc;

use splatforge_api::billing::BillingClient;
use splatforge_api::config::ServerConfig;
use splatforge_api::router::build_app_router;
use splatforge_api::state::AppState;
use splatforge_db::PgStore;
use splatforge_inference::{build_http_client, AssetFetcher, InferenceConfig};
use splatforge_pipeline::{Orchestrator, QuotaTracker, SceneLibrary};
use splatforge_storage::{build_asset_store, AssetStore, StorageConfig, UnavailableAssetStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Timeout for billing provider calls.
const BILLING_TIMEOUT_SECS: u64 = 30;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "splatforge_api=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        free_limit = ?config.quota.free_limit,
        billing = config.billing.is_some(),
        "Loaded server configuration"
    );

    let inference = InferenceConfig::from_env();
    tracing::info!(
        splat = inference.splat_endpoint_url.is_some(),
        mesh = inference.mesh.is_some(),
        image = inference.image.is_some(),
        timeout_secs = inference.timeout_secs,
        "Loaded inference configuration"
    );
    if config.request_timeout_secs <= inference.timeout_secs {
        tracing::warn!(
            request_timeout_secs = config.request_timeout_secs,
            inference_timeout_secs = inference.timeout_secs,
            "Request timeout does not exceed the inference timeout"
        );
    }

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = splatforge_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    splatforge_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    splatforge_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let store = Arc::new(PgStore::new(pool));

    // --- Asset storage ---
    // Storage errors leave the server up with a store that rejects every write.
    let (assets, local_assets_dir) = match StorageConfig::from_env() {
        Ok(storage) => {
            let local_root = storage.local_root().cloned();
            match build_asset_store(&storage).await {
                Ok(assets) => (assets, local_root),
                Err(e) => {
                    tracing::error!(error = %e, "Asset storage unavailable");
                    (unavailable_store(e.to_string()), None)
                }
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Asset storage misconfigured");
            (unavailable_store(e.to_string()), None)
        }
    };
    tracing::info!(backend = assets.backend(), "Asset storage ready");

    // --- Outbound clients ---
    let http = build_http_client(inference.timeout_secs).expect("Failed to build HTTP client");
    let quota = QuotaTracker::new(store.clone(), config.quota);
    let orchestrator = Orchestrator::new(
        quota,
        store.clone(),
        assets,
        AssetFetcher::new(http.clone(), inference.timeout_secs),
    )
    .with_inference(&inference, &http);

    let billing = config.billing.clone().map(|billing| {
        let http = build_http_client(BILLING_TIMEOUT_SECS).expect("Failed to build HTTP client");
        Arc::new(BillingClient::new(http, billing))
    });

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        users: store.clone(),
        orchestrator: Arc::new(orchestrator),
        library: SceneLibrary::new(store),
        billing,
        local_assets_dir,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

fn unavailable_store(reason: String) -> Arc<dyn AssetStore> {
    Arc::new(UnavailableAssetStore::new(reason))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
