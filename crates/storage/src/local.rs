//! Filesystem backend for development and single-node deployments.

use async_trait::async_trait;
use splatforge_core::storage_key::StorageKey;

use crate::config::{LocalStorageConfig, LOCAL_ASSETS_MOUNT};
use crate::{AssetStore, StorageError, StoredAsset};

/// Writes assets below a root directory that the API serves statically.
pub struct LocalAssetStore {
    config: LocalStorageConfig,
}

impl LocalAssetStore {
    pub fn new(config: LocalStorageConfig) -> Self {
        Self { config }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}{LOCAL_ASSETS_MOUNT}/{key}", self.config.public_base_url)
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn put(
        &self,
        key: &StorageKey,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<StoredAsset, StorageError> {
        let path = self.config.root.join(key.as_str());
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = bytes.len();
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(key = %key, size, path = %path.display(), "Asset written to local storage");

        Ok(StoredAsset {
            key: key.to_string(),
            url: self.url_for(key.as_str()),
        })
    }
}
