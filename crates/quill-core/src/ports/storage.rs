//! Object store port - where uploaded images live.

use async_trait::async_trait;

/// Object store trait - abstraction over hosted buckets and local fakes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `path` and return its public URL.
    /// Existing objects are never overwritten.
    async fn put(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError>;
}

/// Object store errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Connection failed: {0}")]
    Connection(String),
}
