//! Environment-driven backend selection.

use std::path::PathBuf;

use crate::StorageError;

/// URL path under which the API serves the local asset directory.
pub const LOCAL_ASSETS_MOUNT: &str = "/assets";

const DEFAULT_LOCAL_DIR: &str = "public/assets";
const DEFAULT_REGION: &str = "auto";

#[derive(Debug, Clone)]
pub enum StorageConfig {
    Local(LocalStorageConfig),
    S3(S3StorageConfig),
}

#[derive(Debug, Clone)]
pub struct LocalStorageConfig {
    /// Directory files are written under.
    pub root: PathBuf,
    /// Prefix for returned URLs, e.g. `https://api.example.com`. Empty
    /// yields relative URLs.
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers; enables path-style
    /// addressing.
    pub endpoint: Option<String>,
    /// Public origin objects are served from (CDN or bucket domain).
    pub public_url: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl StorageConfig {
    /// Load storage configuration from environment variables.
    ///
    /// Object storage is used when both credential variables are present;
    /// otherwise files go to the local filesystem.
    ///
    /// | Env Var                     | Default          |
    /// |-----------------------------|------------------|
    /// | `STORAGE_ACCESS_KEY_ID`     | (unset: local)   |
    /// | `STORAGE_SECRET_ACCESS_KEY` | (unset: local)   |
    /// | `STORAGE_BUCKET`            | required for S3  |
    /// | `STORAGE_REGION`            | `auto`           |
    /// | `STORAGE_ENDPOINT`          | AWS default      |
    /// | `STORAGE_PUBLIC_URL`        | derived          |
    /// | `LOCAL_STORAGE_DIR`         | `public/assets`  |
    /// | `PUBLIC_BASE_URL`           | empty (relative) |
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StorageError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        match (get("STORAGE_ACCESS_KEY_ID"), get("STORAGE_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => {
                let bucket = get("STORAGE_BUCKET").ok_or_else(|| {
                    StorageError::Misconfigured(
                        "STORAGE_BUCKET must be set when storage credentials are configured".into(),
                    )
                })?;
                Ok(Self::S3(S3StorageConfig {
                    bucket,
                    region: get("STORAGE_REGION").unwrap_or_else(|| DEFAULT_REGION.into()),
                    endpoint: get("STORAGE_ENDPOINT").map(|e| e.trim_end_matches('/').to_string()),
                    public_url: get("STORAGE_PUBLIC_URL")
                        .map(|u| u.trim_end_matches('/').to_string()),
                    access_key_id,
                    secret_access_key,
                }))
            }
            (Some(_), None) | (None, Some(_)) => Err(StorageError::Misconfigured(
                "STORAGE_ACCESS_KEY_ID and STORAGE_SECRET_ACCESS_KEY must be set together".into(),
            )),
            (None, None) => Ok(Self::Local(LocalStorageConfig {
                root: get("LOCAL_STORAGE_DIR")
                    .unwrap_or_else(|| DEFAULT_LOCAL_DIR.into())
                    .into(),
                public_base_url: get("PUBLIC_BASE_URL")
                    .map(|u| u.trim_end_matches('/').to_string())
                    .unwrap_or_default(),
            })),
        }
    }

    /// Local directory to serve under [`LOCAL_ASSETS_MOUNT`], if any.
    pub fn local_root(&self) -> Option<&PathBuf> {
        match self {
            Self::Local(local) => Some(&local.root),
            Self::S3(_) => None,
        }
    }
}

impl S3StorageConfig {
    /// Public URL of an object under this configuration.
    ///
    /// Preference: explicit public URL, then path-style on the custom
    /// endpoint, then the virtual-hosted AWS domain.
    pub fn object_url(&self, key: &str) -> String {
        match (&self.public_url, &self.endpoint) {
            (Some(public), _) => format!("{public}/{key}"),
            (None, Some(endpoint)) => format!("{endpoint}/{}/{key}", self.bucket),
            (None, None) => format!(
                "https://{}.s3.{}.amazonaws.com/{key}",
                self.bucket, self.region
            ),
        }
    }
}
