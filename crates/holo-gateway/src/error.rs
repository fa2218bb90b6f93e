//! Error types and the JSON error envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use holo_blobstore::BlobStoreError;
use holo_core::TranslateError;
use holo_fhir::FhirError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Step of hologram creation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CreateStep {
    Author,
    Patient,
    Hologram,
    Upload,
    AttachmentUrl,
}

impl CreateStep {
    /// Get the step name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Patient => "patient",
            Self::Hologram => "hologram",
            Self::Upload => "upload",
            Self::AttachmentUrl => "attachment URL",
        }
    }
}

impl fmt::Display for CreateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request rejected before any outbound call
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Backend unreachable or answered with an unexpected status
    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },

    /// Backend refused a write
    #[error("{message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("translation error: {0}")]
    Translation(#[from] TranslateError),

    #[error("object store error: {0}")]
    BlobStore(#[from] BlobStoreError),

    /// Hologram creation stopped part way; earlier steps are not undone
    #[error("hologram creation failed at the {step} step: {source}")]
    Create {
        step: CreateStep,
        source: Box<ApiError>,
    },

    #[error("Please reduce your request rate")]
    RateLimited,
}

impl ApiError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap an error with the create step it happened in
    pub fn at_step(self, step: CreateStep) -> Self {
        Self::Create {
            step,
            source: Box::new(self),
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamRejected { status, .. } if (400..500).contains(status) => {
                StatusCode::BAD_REQUEST
            }
            Self::Upstream { .. }
            | Self::UpstreamRejected { .. }
            | Self::Translation(_)
            | Self::BlobStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Create { source, .. } => source.status_code(),
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<FhirError> for ApiError {
    fn from(err: FhirError) -> Self {
        match err {
            FhirError::Status { status, body } => Self::Upstream {
                status: Some(status),
                message: format!("backend returned {status}: {body}"),
            },
            other => Self::Upstream {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

/// JSON error envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_code: String,
    pub error_message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorBody {
            error_code: status.as_u16().to_string(),
            error_message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
