//! Hologram handlers

use super::required_ids;
use crate::upload::parse_upload;
use crate::{ApiError, AppState, CreatedHologram};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use holo_core::{DocumentReference, Hologram};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;
use url::form_urlencoded::byte_serialize;

/// Response header listing ids whose results may be incomplete
pub const PARTIAL_IDS_HEADER: &str = "x-holo-partial-ids";

/// Query parameters for the hologram mass lookup
#[derive(Debug, Default, Deserialize)]
pub struct HologramsQuery {
    pub hids: Option<String>,
    pub pids: Option<String>,
    pub creationmode: Option<String>,
}

/// GET /holograms?hids=.. or ?pids=..[&creationmode=..]
pub async fn list_holograms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HologramsQuery>,
) -> Result<Response, ApiError> {
    match (query.hids.as_deref(), query.pids.as_deref()) {
        (Some(_), Some(_)) => Err(ApiError::validation(
            "Only one of hids or pids can be used in a query",
        )),
        (None, None) => Err(ApiError::validation(
            "Either hids or pids must be provided for this query",
        )),
        (Some(hids), None) => {
            if query.creationmode.is_some() {
                return Err(ApiError::validation(
                    "creationmode can only be used together with pids",
                ));
            }
            let hids = required_ids("hids", Some(hids))?;
            let holograms = state.orchestrator.lookup_holograms(&hids).await?;
            Ok(Json(holograms).into_response())
        }
        (None, Some(pids)) => {
            let pids = required_ids("pids", Some(pids))?;
            let lookup = state
                .orchestrator
                .lookup_holograms_by_patient(&pids, query.creationmode.as_deref())
                .await;

            let mut response = Json(lookup.holograms).into_response();
            if !lookup.partial.is_empty() {
                let value = partial_ids_header(&lookup.partial);
                warn!(pids = ?lookup.partial, "Returning incomplete hologram lists");
                response.headers_mut().insert(PARTIAL_IDS_HEADER, value);
            }
            Ok(response)
        }
    }
}

/// GET /holograms/{hid} - Look up one hologram
pub async fn get_hologram(
    State(state): State<Arc<AppState>>,
    Path(hid): Path<String>,
) -> Result<Json<Hologram>, ApiError> {
    let hologram = state.orchestrator.lookup::<DocumentReference>(&hid).await?;
    Ok(Json(hologram))
}

/// POST /holograms - Upload a hologram with its author and patient
pub async fn create_hologram(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CreatedHologram>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;
    let new = parse_upload(multipart).await?;
    let created = state.orchestrator.create(new).await?;
    Ok(Json(created))
}

/// DELETE /holograms/{hid} - Delete a hologram and its binary
pub async fn delete_hologram(
    State(state): State<Arc<AppState>>,
    Path(hid): Path<String>,
) -> Result<Response, ApiError> {
    state.orchestrator.delete(&hid).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "success": format!("Deleted hid '{hid}'") })),
    )
        .into_response())
}

/// GET /holograms/{hid}/download - Stream the hologram binary
pub async fn download_hologram(
    State(state): State<Arc<AppState>>,
    Path(hid): Path<String>,
) -> Result<Response, ApiError> {
    let download = state.orchestrator.download(&hid).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_filename(&download.filename)
    );
    let content_type = HeaderValue::from_str(&download.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut response = (StatusCode::OK, download.data).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// Comma-separated, percent-encoded ids
fn partial_ids_header(ids: &BTreeSet<String>) -> HeaderValue {
    let encoded = ids
        .iter()
        .map(|id| byte_serialize(id.as_bytes()).collect::<String>())
        .collect::<Vec<_>>()
        .join(",");
    HeaderValue::from_str(&encoded).unwrap_or_else(|_| HeaderValue::from_static("*"))
}

/// Restrict a filename to visible ASCII without quotes or backslashes
fn attachment_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}
