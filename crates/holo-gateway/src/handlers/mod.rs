//! REST API request handlers

pub mod authors;
pub mod holograms;
pub mod patients;
pub mod service;

pub use authors::*;
pub use holograms::*;
pub use patients::*;
pub use service::*;

use crate::orchestrator::parse_id_list;
use crate::ApiError;
use axum::http::{header, HeaderMap, StatusCode};
use bytes::Bytes;
use serde::de::DeserializeOwned;

/// Decode a JSON request body, requiring `Content-Type: application/json`
pub(crate) fn json_body<T: DeserializeOwned>(headers: &HeaderMap, body: &Bytes) -> Result<T, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    let essence = content_type.split(';').next().unwrap_or_default().trim();

    if !essence.eq_ignore_ascii_case("application/json") {
        return Err(ApiError::validation(format!(
            "Expected Content-Type: 'application/json', got '{essence}'"
        )));
    }

    serde_json::from_slice(body).map_err(|e| ApiError::validation(format!("Decode Error: {e}")))
}

/// Split a comma-separated id query, rejecting an empty list
pub(crate) fn required_ids(param: &str, raw: Option<&str>) -> Result<Vec<String>, ApiError> {
    let ids = raw.map(parse_id_list).unwrap_or_default();
    if ids.is_empty() {
        return Err(ApiError::validation(format!(
            "No {param} were provided for this query"
        )));
    }
    Ok(ids)
}

/// Relay the backend's write status, falling back to 200
pub(crate) fn write_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(StatusCode::is_success)
        .unwrap_or(StatusCode::OK)
}
