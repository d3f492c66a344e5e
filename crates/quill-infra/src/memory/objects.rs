//! In-memory object store for local runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use quill_core::ports::{ObjectStore, StorageError};

struct StoredObject {
    content_type: String,
    bytes: Vec<u8>,
}

/// Keeps uploaded objects in a map and serves them under `base_url`.
pub struct InMemoryObjectStore {
    base_url: String,
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Content type and size of a stored object.
    pub async fn stat(&self, path: &str) -> Option<(String, usize)> {
        let objects = self.objects.read().await;
        objects
            .get(path)
            .map(|o| (o.content_type.clone(), o.bytes.len()))
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new("http://localhost:8080/uploads")
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let mut objects = self.objects.write().await;
        if objects.contains_key(path) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }

        objects.insert(
            path.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(format!("{}/{}", self.base_url, path))
    }
}
