//! In-memory object store for development and testing

use crate::{validate_key, BlobStore, BlobStoreError, Result, DEFAULT_CONTAINER};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;

/// Stored object
#[derive(Clone, Debug)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

/// An in-memory object store
///
/// Clones share the same objects.
#[derive(Clone)]
pub struct MemoryBlobStore {
    container: String,
    objects: Arc<DashMap<String, StoredObject>>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONTAINER)
    }
}

impl MemoryBlobStore {
    /// Create a new empty memory store
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            objects: Arc::new(DashMap::new()),
        }
    }

    /// Get the number of objects stored
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Check if an object exists
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// Content type an object was stored with
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.get(key).map(|o| o.content_type.clone())
    }

    /// List all keys
    pub fn keys(&self) -> Vec<String> {
        self.objects.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<String> {
        validate_key(key)?;
        self.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(self.url_for(key))
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        validate_key(key)?;
        self.objects
            .get(key)
            .map(|entry| entry.data.clone())
            .ok_or_else(|| BlobStoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BlobStoreError::NotFound(key.to_string()))
    }

    fn url_for(&self, key: &str) -> String {
        format!("memory://{}/{}", self.container, key)
    }
}
