use std::path::PathBuf;
use std::sync::Arc;

use splatforge_db::UserStore;
use splatforge_pipeline::{Orchestrator, SceneLibrary};

use crate::billing::BillingClient;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// User records (sign-in, billing flags, health check).
    pub users: Arc<dyn UserStore>,
    /// Generation flow: quota, storage, inference, scene recording.
    pub orchestrator: Arc<Orchestrator>,
    /// Owner-scoped scene reads and edits.
    pub library: SceneLibrary,
    /// Billing provider client; `None` when billing is disabled.
    pub billing: Option<Arc<BillingClient>>,
    /// Directory served at `/assets` when the local storage backend is used.
    pub local_assets_dir: Option<PathBuf>,
}
