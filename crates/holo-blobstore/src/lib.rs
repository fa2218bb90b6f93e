//! # Holo Blobstore
//!
//! Object storage for hologram binaries.
//!
//! Holograms are stored flat under `{hid}.glb` inside one container. The
//! store hands back a retrieval URL on upload, which the gateway records in
//! the DocumentReference attachment.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          GatewayOrchestrator            │
//! ├─────────────────────────────────────────┤
//! │            BlobStore Trait              │
//! ├────────────────────┬────────────────────┤
//! │   HttpBlobStore    │  MemoryBlobStore   │
//! ├────────────────────┴────────────────────┤
//! │        Object storage service           │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use holo_blobstore::{hologram_key, BlobStore, MemoryBlobStore};
//!
//! let store = MemoryBlobStore::new("holograms");
//! let key = hologram_key("h-1")?;
//! let url = store.put(&key, data, "model/gltf-binary").await?;
//! let retrieved = store.get(&key).await?;
//! ```

pub mod error;
pub mod flexible;
pub mod http;
pub mod memory;

pub use error::{BlobStoreError, Result};
pub use flexible::FlexibleBlobStore;
pub use http::{HttpBlobStore, HttpBlobStoreConfig};
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use bytes::Bytes;

/// Default container for hologram binaries
pub const DEFAULT_CONTAINER: &str = "holograms";

/// Trait for object storage backends
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store an object and return its retrieval URL
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<String>;

    /// Retrieve an object
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Delete an object
    async fn delete(&self, key: &str) -> Result<()>;

    /// Retrieval URL of an object, whether or not it exists
    fn url_for(&self, key: &str) -> String;
}

/// Object key of a hologram binary
pub fn hologram_key(hid: &str) -> Result<String> {
    let key = format!("{hid}.glb");
    validate_key(&key)?;
    Ok(key)
}

/// Check that a key names a single flat object
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(BlobStoreError::InvalidKey("key is empty".to_string()));
    }
    if key.contains('/') || key.contains('\\') {
        return Err(BlobStoreError::InvalidKey(format!(
            "key '{key}' contains a path separator"
        )));
    }
    if key == "." || key == ".." {
        return Err(BlobStoreError::InvalidKey(format!(
            "key '{key}' names a directory"
        )));
    }
    Ok(())
}
