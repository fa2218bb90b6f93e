//! Error types for the holo-core crate

use thiserror::Error;

/// Result type alias using `TranslateError`
pub type Result<T> = std::result::Result<T, TranslateError>;

/// Errors that can occur while translating backend payloads
#[derive(Error, Debug)]
pub enum TranslateError {
    /// Payload is not valid JSON for the expected resource
    #[error("malformed {resource_type} payload: {source}")]
    Malformed {
        resource_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Payload parsed but carries a different resourceType
    #[error("expected resourceType '{expected}', got '{actual}'")]
    WrongResourceType {
        expected: &'static str,
        actual: String,
    },

    /// Backend response is missing its server-assigned id
    #[error("{0} payload has no id")]
    MissingId(&'static str),

    /// DocumentReference has no content entry to attach a URL to
    #[error("no content within DocumentReference")]
    MissingContent,

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
