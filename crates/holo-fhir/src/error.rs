//! Client error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, FhirError>;

/// FHIR client errors
#[derive(Error, Debug)]
pub enum FhirError {
    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Request never produced an HTTP response
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-2xx status
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Payload is not a bundle
    #[error("malformed bundle: {0}")]
    MalformedBundle(String),
}

impl FhirError {
    /// Check if the backend reported the resource as absent (404 or 410)
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Status { status: 404 | 410, .. })
    }

    /// Backend status code, if the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
