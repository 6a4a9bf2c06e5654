use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;

/// Error type for object storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Object storage seam. `put` writes the object and returns its public URL.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// Filesystem-backed storage for local development and tests.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let path = self.base_path.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        Ok(format!("file://{}", path.display()))
    }
}

/// How the GCS client authenticates.
pub enum GcsAuth {
    /// Token supplied through configuration.
    StaticToken(String),
    /// Fetch short-lived tokens from the GCE metadata server.
    MetadataServer,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Google Cloud Storage backend over the JSON upload API.
pub struct GcsStorage {
    client: Client,
    bucket: String,
    auth: GcsAuth,
    token_cache: RwLock<Option<CachedToken>>,
}

const GCS_UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

impl GcsStorage {
    pub fn new(bucket: String, auth: GcsAuth) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            bucket,
            auth,
            token_cache: RwLock::new(None),
        }
    }

    /// Canonical public URL of an object in this bucket.
    fn object_url(&self, key: &str) -> String {
        format!("https://storage.googleapis.com/{}/{}", self.bucket, key)
    }

    async fn access_token(&self) -> Result<String, StorageError> {
        let token = match &self.auth {
            GcsAuth::StaticToken(token) => token.clone(),
            GcsAuth::MetadataServer => {
                let mut cache = self.token_cache.write().await;

                // Refresh when missing or within a minute of expiry.
                let stale = match cache.as_ref() {
                    Some(cached) => cached.expires_at <= Instant::now() + Duration::from_secs(60),
                    None => true,
                };

                if stale {
                    let response = self
                        .client
                        .get(METADATA_TOKEN_URL)
                        .header("Metadata-Flavor", "Google")
                        .send()
                        .await
                        .map_err(|e| StorageError::Auth(e.to_string()))?;

                    if !response.status().is_success() {
                        return Err(StorageError::Auth(format!(
                            "Metadata server returned {}",
                            response.status()
                        )));
                    }

                    let token: TokenResponse = response
                        .json()
                        .await
                        .map_err(|e| StorageError::Auth(e.to_string()))?;

                    tracing::debug!(expires_in = token.expires_in, "Fetched GCS access token");

                    *cache = Some(CachedToken {
                        token: token.access_token,
                        expires_at: Instant::now() + Duration::from_secs(token.expires_in),
                    });
                }

                cache
                    .as_ref()
                    .map(|cached| cached.token.clone())
                    .unwrap_or_default()
            }
        };

        Ok(token)
    }
}

#[async_trait]
impl Storage for GcsStorage {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let token = self.access_token().await?;

        let upload_url = format!("{}/b/{}/o", GCS_UPLOAD_BASE, self.bucket);
        let response = self
            .client
            .post(&upload_url)
            .query(&[("uploadType", "media"), ("name", key)])
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StorageError::Api(format!(
                "GCS upload failed {}: {}",
                status, error_text
            )));
        }

        Ok(self.object_url(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_url_joins_bucket_and_key() {
        let storage = GcsStorage::new(
            "gcp-project-image-generator".to_string(),
            GcsAuth::StaticToken("token".to_string()),
        );

        assert_eq!(
            storage.object_url("generated-images/abc.png"),
            "https://storage.googleapis.com/gcp-project-image-generator/generated-images/abc.png"
        );
    }

    #[tokio::test]
    async fn local_storage_writes_file_and_returns_url() {
        let base = format!("target/test-storage-{}", uuid::Uuid::new_v4());
        let storage = LocalStorage::new(&base).await.unwrap();

        let url = storage
            .put("generated-images/img.png", b"data".to_vec(), "image/png")
            .await
            .unwrap();

        assert!(url.starts_with("file://"));
        assert!(url.ends_with("generated-images/img.png"));

        let on_disk = tokio::fs::read(format!("{}/generated-images/img.png", base))
            .await
            .unwrap();
        assert_eq!(on_disk, b"data");

        let _ = tokio::fs::remove_dir_all(&base).await;
    }
}
