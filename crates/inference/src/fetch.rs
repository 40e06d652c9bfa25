//! Downloads generated files so they can be re-hosted in our own storage.

use crate::error::{ensure_success, InferenceError};

pub struct AssetFetcher {
    http: reqwest::Client,
    timeout_secs: u64,
}

impl AssetFetcher {
    pub fn new(http: reqwest::Client, timeout_secs: u64) -> Self {
        Self { http, timeout_secs }
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, InferenceError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| InferenceError::from_reqwest(e, self.timeout_secs))?;
        let response = ensure_success(response, self.timeout_secs).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| InferenceError::from_reqwest(e, self.timeout_secs))?;

        if bytes.is_empty() {
            return Err(InferenceError::Decode(format!("downloaded asset at {url} is empty")));
        }
        tracing::debug!(url, size = bytes.len(), "Fetched generated asset");
        Ok(bytes.to_vec())
    }
}
