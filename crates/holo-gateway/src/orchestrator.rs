//! Gateway operations over the FHIR backend and the object store
//!
//! Each operation builds correlated requests, runs them through the FHIR
//! client, translates what comes back and maps every outcome to a typed
//! [`ApiError`].
//!
//! Hologram creation is not atomic. The author, patient, metadata and binary
//! are written in that order and the first failing step aborts the call with
//! [`ApiError::Create`]; whatever was written before it stays written.

use crate::{ApiError, CreateStep};
use bytes::Bytes;
use holo_blobstore::{hologram_key, BlobStore};
use holo_core::{
    parse_resource, resource_from_value, Author, DocumentReference, FhirResource, Hologram,
    Patient, PatientResource, Practitioner, TranslateError,
};
use holo_fhir::{FhirClient, FhirRequest, FhirResult};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

type Result<T> = std::result::Result<T, ApiError>;

/// Content type used when an upload does not name one
pub const DEFAULT_CONTENT_TYPE: &str = "model/gltf-binary";

/// Everything needed to create a hologram
#[derive(Clone, Debug, Default)]
pub struct NewHologram {
    pub author: Author,
    pub patient: Patient,
    pub hologram: Hologram,
    pub file: Bytes,
}

/// Response of a successful create
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedHologram {
    #[serde(flatten)]
    pub hologram: Hologram,
    /// Where the binary was stored
    pub storage_url: String,
}

/// Hologram binary ready to be served
#[derive(Clone, Debug)]
pub struct Download {
    pub data: Bytes,
    pub content_type: String,
    /// Suggested file name, `{title}.glb`
    pub filename: String,
}

/// Holograms grouped by patient
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationLookup {
    pub holograms: BTreeMap<String, Vec<Hologram>>,
    /// Patients whose result may be incomplete
    pub partial: BTreeSet<String>,
}

/// Split a comma-separated id list, dropping blanks and duplicates
pub fn parse_id_list(raw: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Orchestrates the gateway operations
#[derive(Clone)]
pub struct Orchestrator {
    fhir: FhirClient,
    blobs: Arc<dyn BlobStore>,
}

impl Orchestrator {
    /// Create an orchestrator over a FHIR client and an object store
    pub fn new(fhir: FhirClient, blobs: Arc<dyn BlobStore>) -> Self {
        Self { fhir, blobs }
    }

    /// Get the FHIR client
    pub fn fhir(&self) -> &FhirClient {
        &self.fhir
    }

    // ==================== Lookups ====================

    /// Look up one record by id
    #[instrument(skip(self), fields(resource = R::RESOURCE_TYPE))]
    pub async fn lookup<R: FhirResource>(&self, id: &str) -> Result<R::Domain> {
        require_id(R::ID_FIELD, id)?;
        let result = self
            .fhir
            .execute_one(FhirRequest::get(self.fhir.instance_url(R::RESOURCE_TYPE, id)))
            .await;
        if result.is_gone() {
            return Err(not_found(id));
        }
        let payload = result.into_payload()?;
        Ok(parse_resource::<R>(&payload)?.to_domain())
    }

    /// Look up many records; ids the backend does not return map to a blank
    /// record
    #[instrument(skip(self), fields(resource = R::RESOURCE_TYPE, count = ids.len()))]
    pub async fn lookup_many<R: FhirResource>(
        &self,
        ids: &[String],
    ) -> Result<BTreeMap<String, R::Domain>> {
        let found = self.batch_lookup::<R>(ids).await?;
        Ok(found
            .into_iter()
            .map(|(id, record)| (id, record.unwrap_or_default()))
            .collect())
    }

    /// Look up holograms by id; ids the backend does not return map to an
    /// empty list
    #[instrument(skip(self), fields(count = hids.len()))]
    pub async fn lookup_holograms(&self, hids: &[String]) -> Result<BTreeMap<String, Vec<Hologram>>> {
        let found = self.batch_lookup::<DocumentReference>(hids).await?;
        Ok(found
            .into_iter()
            .map(|(id, record)| (id, record.into_iter().collect()))
            .collect())
    }

    async fn batch_lookup<R: FhirResource>(
        &self,
        ids: &[String],
    ) -> Result<BTreeMap<String, Option<R::Domain>>> {
        let requests: HashMap<String, FhirRequest> = ids
            .iter()
            .map(|id| {
                let request = FhirRequest::get(self.fhir.instance_url(R::RESOURCE_TYPE, id));
                (id.clone(), request)
            })
            .collect();

        let results = self.fhir.execute_batch(requests).await;

        let mut found = BTreeMap::new();
        for (id, result) in results {
            let record = match (result.status, &result.payload) {
                (Some(200), Some(payload)) => Some(parse_resource::<R>(payload)?.to_domain()),
                _ => {
                    log_miss(&result);
                    None
                }
            };
            found.insert(id, record);
        }
        Ok(found)
    }

    /// Find every hologram of each patient, optionally filtered by creation
    /// mode
    #[instrument(skip(self), fields(count = pids.len()))]
    pub async fn lookup_holograms_by_patient(
        &self,
        pids: &[String],
        creation_mode: Option<&str>,
    ) -> RelationLookup {
        let search_url = self.fhir.type_url(DocumentReference::RESOURCE_TYPE);
        let requests: HashMap<String, FhirRequest> = pids
            .iter()
            .map(|pid| {
                let mut request = FhirRequest::get(search_url.clone()).with_query("subject", pid);
                if let Some(mode) = creation_mode.filter(|m| !m.is_empty()) {
                    request = request.with_query("type:text", mode);
                }
                (pid.clone(), request)
            })
            .collect();

        let outcomes = self.fhir.crawl(requests).await;

        let mut lookup = RelationLookup::default();
        for (pid, outcome) in outcomes {
            if outcome.is_partial() {
                lookup.partial.insert(pid.clone());
            }
            let mut holograms = Vec::with_capacity(outcome.entries.len());
            for entry in outcome.entries {
                match resource_from_value::<DocumentReference>(entry) {
                    Ok(resource) => holograms.push(resource.to_domain()),
                    Err(e) => {
                        warn!(pid = %pid, error = %e, "Skipping untranslatable search entry");
                        lookup.partial.insert(pid.clone());
                    }
                }
            }
            lookup.holograms.insert(pid, holograms);
        }
        lookup
    }

    // ==================== Writes ====================

    /// Create or replace an author or patient, returning the backend status
    #[instrument(skip(self, record), fields(resource = R::RESOURCE_TYPE))]
    pub async fn upsert<R: FhirResource>(
        &self,
        path_id: &str,
        record: R::Domain,
    ) -> Result<(u16, R::Domain)> {
        require_id(R::ID_FIELD, path_id)?;
        if R::domain_id(&record) != Some(path_id) {
            return Err(ApiError::validation(format!(
                "{} in param and body do not match",
                R::ID_FIELD
            )));
        }
        let status = self.put_resource(path_id, &R::from_domain(&record)).await?;
        Ok((status, record))
    }

    async fn put_resource<R: FhirResource>(&self, id: &str, resource: &R) -> Result<u16> {
        let body = serde_json::to_value(resource).map_err(TranslateError::from)?;
        let request = FhirRequest::put(self.fhir.instance_url(R::RESOURCE_TYPE, id), body);
        let result = self.fhir.execute_one(request).await;
        accept_write(result)
    }

    /// Create a hologram: author, patient, metadata, binary, then the
    /// metadata again with the binary's URL
    #[instrument(skip(self, new), fields(size = new.file.len()))]
    pub async fn create(&self, new: NewHologram) -> Result<CreatedHologram> {
        let NewHologram {
            author,
            patient,
            mut hologram,
            file,
        } = new;

        let aid = author
            .aid
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::validation("author.aid is required"))?;
        let pid = patient
            .pid
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::validation("patient.pid is required"))?;
        if hologram.title.as_deref().map_or(true, str::is_empty) {
            return Err(ApiError::validation("title is required"));
        }
        if file.is_empty() {
            return Err(ApiError::validation("hologramFile is empty"));
        }

        self.put_resource(&aid, &Practitioner::from_domain(&author))
            .await
            .map_err(|e| e.at_step(CreateStep::Author))?;
        self.put_resource(&pid, &PatientResource::from_domain(&patient))
            .await
            .map_err(|e| e.at_step(CreateStep::Patient))?;

        hologram.hid = None;
        hologram.aid = Some(aid);
        hologram.pid = Some(pid);
        let content_type = hologram
            .content_type
            .get_or_insert_with(|| DEFAULT_CONTENT_TYPE.to_string())
            .clone();

        let mut created = self
            .post_hologram(&hologram)
            .await
            .map_err(|e| e.at_step(CreateStep::Hologram))?;
        let hid = created
            .id
            .clone()
            .ok_or(TranslateError::MissingId(DocumentReference::RESOURCE_TYPE))
            .map_err(|e| ApiError::from(e).at_step(CreateStep::Hologram))?;
        info!(hid = %hid, "Hologram metadata created");

        let key = hologram_key(&hid).map_err(|e| ApiError::from(e).at_step(CreateStep::Upload))?;
        let storage_url = self
            .blobs
            .put(&key, file, &content_type)
            .await
            .map_err(|e| ApiError::from(e).at_step(CreateStep::Upload))?;
        debug!(hid = %hid, url = %storage_url, "Hologram binary stored");

        created
            .set_attachment_url(storage_url.clone())
            .map_err(|e| ApiError::from(e).at_step(CreateStep::AttachmentUrl))?;
        self.put_resource(&hid, &created)
            .await
            .map_err(|e| e.at_step(CreateStep::AttachmentUrl))?;

        Ok(CreatedHologram {
            hologram: created.to_domain(),
            storage_url,
        })
    }

    async fn post_hologram(&self, hologram: &Hologram) -> Result<DocumentReference> {
        let body = serde_json::to_value(DocumentReference::from_domain(hologram))
            .map_err(TranslateError::from)?;
        let request = FhirRequest::post(self.fhir.type_url(DocumentReference::RESOURCE_TYPE), body);
        let result = self.fhir.execute_one(request).await;
        let payload = result.payload.clone().unwrap_or_default();
        accept_write(result)?;
        Ok(parse_resource::<DocumentReference>(&payload)?)
    }

    /// Delete a hologram's metadata, then its binary
    #[instrument(skip(self))]
    pub async fn delete(&self, hid: &str) -> Result<()> {
        require_id(DocumentReference::ID_FIELD, hid)?;
        let key = blob_key(hid)?;
        let url = self.fhir.instance_url(DocumentReference::RESOURCE_TYPE, hid);

        let existing = self.fhir.execute_one(FhirRequest::get(url.clone())).await;
        if existing.is_gone() {
            return Err(not_found(hid));
        }
        existing.into_payload()?;

        self.fhir
            .execute_one(FhirRequest::delete(url))
            .await
            .into_payload()?;

        match self.blobs.delete(&key).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                warn!(hid = %hid, key = %key, "Hologram binary already absent");
            }
            Err(e) => return Err(e.into()),
        }
        info!(hid = %hid, "Hologram deleted");
        Ok(())
    }

    /// Fetch a hologram's binary along with how to serve it
    #[instrument(skip(self))]
    pub async fn download(&self, hid: &str) -> Result<Download> {
        let key = blob_key(hid)?;
        let hologram = self.lookup::<DocumentReference>(hid).await?;
        let data = self.blobs.get(&key).await?;

        let title = hologram
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| hid.to_string());
        Ok(Download {
            data,
            content_type: hologram
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            filename: format!("{title}.{}", holo_core::HOLOGRAM_EXTENSION),
        })
    }
}

fn require_id(field: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Object key of a caller-supplied hologram id
fn blob_key(hid: &str) -> Result<String> {
    hologram_key(hid).map_err(|e| ApiError::validation(format!("hid '{hid}' is not usable: {e}")))
}

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("id '{id}' cannot be found"))
}

/// Map a write result: transport failures are upstream errors, backend
/// refusals are relayed with their status
fn accept_write(result: FhirResult) -> Result<u16> {
    if let Some(error) = result.error {
        return Err(ApiError::Upstream {
            status: None,
            message: error,
        });
    }
    match result.status {
        Some(status) if (200..300).contains(&status) => Ok(status),
        Some(status) => Err(ApiError::UpstreamRejected {
            status,
            message: String::from_utf8_lossy(&result.payload.unwrap_or_default()).into_owned(),
        }),
        None => Err(ApiError::Upstream {
            status: None,
            message: format!("request '{}' produced no response", result.id),
        }),
    }
}

fn log_miss(result: &FhirResult) {
    match (&result.error, result.status) {
        (Some(error), _) => warn!(id = %result.id, error = %error, "Lookup failed"),
        (None, Some(status)) => debug!(id = %result.id, status, "Lookup returned no record"),
        (None, None) => warn!(id = %result.id, "Lookup produced no response"),
    }
}
