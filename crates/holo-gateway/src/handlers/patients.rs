//! Patient handlers

use super::{json_body, required_ids, write_status};
use crate::{ApiError, AppState};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use holo_core::{Patient, PatientResource};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Query parameters for the patient mass lookup
#[derive(Debug, Default, Deserialize)]
pub struct PatientsQuery {
    pub pids: Option<String>,
}

/// GET /patients/{pid} - Look up one patient
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let patient = state.orchestrator.lookup::<PatientResource>(&pid).await?;
    Ok(Json(patient))
}

/// PUT /patients/{pid} - Create or replace a patient
pub async fn put_patient(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let patient: Patient = json_body(&headers, &body)?;
    let (status, patient) = state.orchestrator.upsert::<PatientResource>(&pid, patient).await?;
    Ok((write_status(status), Json(patient)).into_response())
}

/// GET /patients?pids=a,b - Look up many patients
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PatientsQuery>,
) -> Result<Json<BTreeMap<String, Patient>>, ApiError> {
    let pids = required_ids("pids", query.pids.as_deref())?;
    let patients = state.orchestrator.lookup_many::<PatientResource>(&pids).await?;
    Ok(Json(patients))
}
