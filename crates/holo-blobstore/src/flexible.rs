//! Runtime choice between the HTTP and in-memory stores

use crate::{BlobStore, HttpBlobStore, HttpBlobStoreConfig, MemoryBlobStore, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{info, warn};

/// Object store selected from configuration
#[derive(Clone)]
pub enum FlexibleBlobStore {
    /// Remote object storage
    Http(HttpBlobStore),
    /// In-memory storage (fallback)
    Memory(MemoryBlobStore),
}

impl FlexibleBlobStore {
    /// Use the HTTP store when an endpoint is configured, memory otherwise
    pub fn from_config(config: Option<HttpBlobStoreConfig>, container: &str) -> Result<Self> {
        match config {
            Some(config) => {
                info!(endpoint = %config.endpoint, container = %config.container, "Using HTTP object store");
                Ok(Self::Http(HttpBlobStore::new(config)?))
            }
            None => {
                warn!("No object store endpoint configured, holograms are kept in memory");
                Ok(Self::Memory(MemoryBlobStore::new(container)))
            }
        }
    }

    /// Check if using a real object store or the memory fallback
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

#[async_trait]
impl BlobStore for FlexibleBlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<String> {
        match self {
            Self::Http(store) => store.put(key, data, content_type).await,
            Self::Memory(store) => store.put(key, data, content_type).await,
        }
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        match self {
            Self::Http(store) => store.get(key).await,
            Self::Memory(store) => store.get(key).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Self::Http(store) => store.delete(key).await,
            Self::Memory(store) => store.delete(key).await,
        }
    }

    fn url_for(&self, key: &str) -> String {
        match self {
            Self::Http(store) => store.url_for(key),
            Self::Memory(store) => store.url_for(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let memory = FlexibleBlobStore::from_config(None, "holograms").unwrap();
        assert!(!memory.is_persistent());
        assert_eq!(memory.url_for("h.glb"), "memory://holograms/h.glb");

        let http = FlexibleBlobStore::from_config(
            Some(HttpBlobStoreConfig::with_endpoint("http://blob.test")),
            "holograms",
        )
        .unwrap();
        assert!(http.is_persistent());
        assert_eq!(http.url_for("h.glb"), "http://blob.test/holograms/h.glb");
    }

    #[tokio::test]
    async fn test_memory_dispatch() {
        let store = FlexibleBlobStore::from_config(None, "holograms").unwrap();
        store.put("h.glb", Bytes::from_static(b"x"), "model/gltf-binary").await.unwrap();
        assert_eq!(store.get("h.glb").await.unwrap(), Bytes::from_static(b"x"));
        store.delete("h.glb").await.unwrap();
    }
}
