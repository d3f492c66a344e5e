//! Hosted object bucket speaking the Supabase storage REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use quill_core::ports::{ObjectStore, StorageError};

#[derive(Debug, Clone)]
pub struct BucketConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    pub bucket: String,
    pub api_key: String,
    /// Bound on a whole upload request.
    pub timeout: Duration,
}

pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpObjectStore {
    client: Client,
    base: Url,
    bucket: String,
    api_key: String,
}

impl HttpObjectStore {
    pub fn new(config: BucketConfig) -> Result<Self, StorageError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| StorageError::Connection(format!("invalid storage URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(StorageError::Connection(format!(
                "invalid storage URL: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base,
            bucket: config.bucket,
            api_key: config.api_key,
        })
    }

    fn endpoint(&self, prefix: &[&str], path: &str) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "object"])
                .extend(prefix)
                .extend([self.bucket.as_str(), path]);
        }
        url
    }

    fn upload_url(&self, path: &str) -> Url {
        self.endpoint(&[], path)
    }

    pub fn public_url(&self, path: &str) -> Url {
        self.endpoint(&["public"], path)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let response = self
            .client
            .post(self.upload_url(path))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("content-type", content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StorageError::Connection(format!("upload of {path} timed out"))
                } else {
                    StorageError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(self.public_url(path).to_string());
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT || body.contains("already exists") {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        Err(StorageError::Upload(format!("{status}: {body}")))
    }
}
