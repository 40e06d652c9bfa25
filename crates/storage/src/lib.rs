//! Asset storage backends.
//!
//! Generated inputs and outputs are written through the [`AssetStore`] port
//! and addressed afterwards only by the public URL it returns. The backend
//! is chosen once at startup from the environment (see [`StorageConfig`]).

use std::sync::Arc;

use async_trait::async_trait;
use splatforge_core::storage_key::StorageKey;

pub mod config;
pub mod local;
pub mod s3;

pub use config::{LocalStorageConfig, S3StorageConfig, StorageConfig};
pub use local::LocalAssetStore;
pub use s3::S3AssetStore;

/// Errors raised while persisting an asset.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Required configuration is missing or inconsistent.
    #[error("Storage misconfigured: {0}")]
    Misconfigured(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote object store rejected or failed the request.
    #[error("Remote storage error: {0}")]
    Remote(String),
}

/// Where an asset ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub key: String,
    /// Publicly fetchable URL. Relative (`/assets/...`) for the local
    /// backend when no public base URL is configured.
    pub url: String,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    async fn put(
        &self,
        key: &StorageKey,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredAsset, StorageError>;
}

/// Construct the configured backend.
pub async fn build_asset_store(config: &StorageConfig) -> Result<Arc<dyn AssetStore>, StorageError> {
    match config {
        StorageConfig::Local(local) => Ok(Arc::new(LocalAssetStore::new(local.clone()))),
        StorageConfig::S3(s3) => Ok(Arc::new(S3AssetStore::connect(s3.clone()).await?)),
    }
}

/// Stand-in used when the storage configuration could not be loaded.
///
/// The server still boots so that health checks and scene reads work;
/// every write fails with [`StorageError::Misconfigured`].
pub struct UnavailableAssetStore {
    reason: String,
}

impl UnavailableAssetStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl AssetStore for UnavailableAssetStore {
    fn backend(&self) -> &'static str {
        "unavailable"
    }

    async fn put(
        &self,
        _key: &StorageKey,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<StoredAsset, StorageError> {
        Err(StorageError::Misconfigured(self.reason.clone()))
    }
}
