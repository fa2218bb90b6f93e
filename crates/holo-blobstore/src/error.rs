//! Error types for the holo-blobstore crate

use thiserror::Error;

/// Result type alias using `BlobStoreError`
pub type Result<T> = std::result::Result<T, BlobStoreError>;

/// Errors that can occur during object storage operations
#[derive(Error, Debug)]
pub enum BlobStoreError {
    /// Object not found
    #[error("object not found: {0}")]
    NotFound(String),

    /// Key cannot be stored
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Storage service rejected the request
    #[error("storage service returned {status}: {message}")]
    Service { status: u16, message: String },

    /// Connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Timeout error
    #[error("operation timed out")]
    Timeout,

    /// HTTP error
    #[error("http error: {0}")]
    Http(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BlobStoreError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for BlobStoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BlobStoreError::Timeout
        } else if err.is_connect() {
            BlobStoreError::Connection(err.to_string())
        } else {
            BlobStoreError::Http(err.to_string())
        }
    }
}
