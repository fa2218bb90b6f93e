//! Author handlers

use super::{json_body, required_ids, write_status};
use crate::{ApiError, AppState};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use holo_core::{Author, Practitioner};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Query parameters for the author mass lookup
#[derive(Debug, Default, Deserialize)]
pub struct AuthorsQuery {
    pub aids: Option<String>,
}

/// GET /authors/{aid} - Look up one author
pub async fn get_author(
    State(state): State<Arc<AppState>>,
    Path(aid): Path<String>,
) -> Result<Json<Author>, ApiError> {
    let author = state.orchestrator.lookup::<Practitioner>(&aid).await?;
    Ok(Json(author))
}

/// PUT /authors/{aid} - Create or replace an author
pub async fn put_author(
    State(state): State<Arc<AppState>>,
    Path(aid): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let author: Author = json_body(&headers, &body)?;
    let (status, author) = state.orchestrator.upsert::<Practitioner>(&aid, author).await?;
    Ok((write_status(status), Json(author)).into_response())
}

/// GET /authors?aids=a,b - Look up many authors
pub async fn list_authors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuthorsQuery>,
) -> Result<Json<BTreeMap<String, Author>>, ApiError> {
    let aids = required_ids("aids", query.aids.as_deref())?;
    let authors = state.orchestrator.lookup_many::<Practitioner>(&aids).await?;
    Ok(Json(authors))
}
