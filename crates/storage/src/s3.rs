//! S3-compatible object storage backend (AWS S3, R2, MinIO, ...).

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use splatforge_core::storage_key::StorageKey;

use crate::config::S3StorageConfig;
use crate::{AssetStore, StorageError, StoredAsset};

pub struct S3AssetStore {
    client: aws_sdk_s3::Client,
    config: S3StorageConfig,
}

impl S3AssetStore {
    /// Build a client from static credentials.
    ///
    /// A custom endpoint switches to path-style addressing, which most
    /// S3-compatible providers require.
    pub async fn connect(config: S3StorageConfig) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "splatforge-env",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = aws_sdk_s3::Client::from_conf(builder.build());

        tracing::info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint,
            "S3 asset store configured",
        );

        Ok(Self { client, config })
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    fn backend(&self) -> &'static str {
        "s3"
    }

    async fn put(
        &self,
        key: &StorageKey,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredAsset, StorageError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key.as_str())
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Remote(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(key = %key, size, bucket = %self.config.bucket, "Asset uploaded to object storage");

        Ok(StoredAsset {
            key: key.to_string(),
            url: self.config.object_url(key.as_str()),
        })
    }
}
