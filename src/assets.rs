//! Asset host collaborator, used for course thumbnails. Uploads happen
//! before anything is persisted; a failed upload aborts the whole
//! create/update.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedAsset {
    pub url: String,
}

#[async_trait]
pub trait AssetHost: Send + Sync {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadedAsset, ApiError>;
    async fn delete(&self, url: &str) -> Result<(), ApiError>;
}

pub struct HttpAssetHost {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpAssetHost {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self { http: reqwest::Client::new(), base_url, api_key }
    }
}

#[async_trait]
impl AssetHost for HttpAssetHost {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadedAsset, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .http
            .post(format!("{}/v1/upload", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Dependency(format!("asset host unreachable: {e}")))?;
        if !res.status().is_success() {
            return Err(ApiError::Dependency(format!("asset upload failed: {}", res.status())));
        }
        res.json()
            .await
            .map_err(|e| ApiError::Dependency(format!("bad asset host response: {e}")))
    }

    async fn delete(&self, url: &str) -> Result<(), ApiError> {
        let res = self
            .http
            .delete(format!("{}/v1/assets", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(|e| ApiError::Dependency(format!("asset host unreachable: {e}")))?;
        if !res.status().is_success() {
            return Err(ApiError::Dependency(format!("asset delete failed: {}", res.status())));
        }
        Ok(())
    }
}
