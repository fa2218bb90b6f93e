//! Translation between domain records and FHIR resources
//!
//! Each resource kind implements [`FhirResource`], a pair of total mapping
//! functions plus the metadata the gateway needs to address it in the
//! backend. Translation never emits an empty nested structure: an absent
//! domain field produces an absent backend field and vice versa.

use crate::domain::{Author, Hologram, Patient, PersonName};
use crate::error::{Result, TranslateError};
use crate::resource::{
    Attachment, CodeableConcept, Content, DocumentReference, HumanName, PatientResource,
    Practitioner, Reference,
};
use crate::BYTES_PER_KB;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

const DOCUMENT_REFERENCE: &str = "DocumentReference";
const PATIENT: &str = "Patient";
const PRACTITIONER: &str = "Practitioner";

/// A backend resource with a flat domain counterpart
pub trait FhirResource: Serialize + DeserializeOwned + Send + 'static {
    /// FHIR `resourceType` and REST path segment
    const RESOURCE_TYPE: &'static str;

    /// Name of the id field in the domain record, e.g. `hid`
    const ID_FIELD: &'static str;

    /// Flat record served by the API
    type Domain: Clone + Default + Serialize + Send;

    /// Translate a domain record into its backend shape
    fn from_domain(domain: &Self::Domain) -> Self;

    /// Translate this resource into its domain record
    fn to_domain(&self) -> Self::Domain;

    /// Server-assigned id
    fn id(&self) -> Option<&str>;

    /// `resourceType` as received
    fn resource_type(&self) -> &str;

    /// Id carried by a domain record
    fn domain_id(domain: &Self::Domain) -> Option<&str>;
}

/// Parse a backend payload into a resource, checking its `resourceType`
pub fn parse_resource<R: FhirResource>(payload: &[u8]) -> Result<R> {
    let resource: R =
        serde_json::from_slice(payload).map_err(|source| TranslateError::Malformed {
            resource_type: R::RESOURCE_TYPE,
            source,
        })?;
    check_resource_type(resource)
}

/// Convert an embedded resource (e.g. a bundle entry), checking its
/// `resourceType`
pub fn resource_from_value<R: FhirResource>(value: serde_json::Value) -> Result<R> {
    let resource: R =
        serde_json::from_value(value).map_err(|source| TranslateError::Malformed {
            resource_type: R::RESOURCE_TYPE,
            source,
        })?;
    check_resource_type(resource)
}

fn check_resource_type<R: FhirResource>(resource: R) -> Result<R> {
    if resource.resource_type() != R::RESOURCE_TYPE {
        return Err(TranslateError::WrongResourceType {
            expected: R::RESOURCE_TYPE,
            actual: resource.resource_type().to_string(),
        });
    }
    Ok(resource)
}

/// Hologram fields without a DocumentReference slot, packed as JSON into
/// `DocumentReference.description`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HologramMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_imaging: Option<DateTime<Utc>>,
}

impl HologramMeta {
    /// Collect the unmapped fields of a hologram
    pub fn from_hologram(hologram: &Hologram) -> Self {
        Self {
            description: non_empty(&hologram.description),
            creation_description: non_empty(&hologram.creation_description),
            body_site: non_empty(&hologram.body_site),
            date_of_imaging: hologram.date_of_imaging,
        }
    }

    /// Pack into the opaque string stored in the backend, `None` if empty
    pub fn pack(&self) -> Option<String> {
        if *self == Self::default() {
            return None;
        }
        // Plain strings and timestamps always serialize
        serde_json::to_string(self).ok()
    }

    /// Unpack the opaque string; malformed text yields an empty meta
    pub fn unpack(packed: Option<&str>) -> Self {
        let Some(text) = packed.filter(|t| !t.is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str(text) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(error = %e, "Failed to parse hologram meta, returning blank meta");
                Self::default()
            }
        }
    }
}

impl DocumentReference {
    /// Inject the storage URL into the first attachment
    pub fn set_attachment_url(&mut self, url: impl Into<String>) -> Result<()> {
        let content = self
            .content
            .first_mut()
            .ok_or(TranslateError::MissingContent)?;
        content
            .attachment
            .get_or_insert_with(Attachment::default)
            .url = Some(url.into());
        Ok(())
    }

    /// Storage URL of the first attachment
    pub fn attachment_url(&self) -> Option<&str> {
        self.content
            .first()
            .and_then(|c| c.attachment.as_ref())
            .and_then(|a| a.url.as_deref())
    }
}

impl FhirResource for DocumentReference {
    const RESOURCE_TYPE: &'static str = DOCUMENT_REFERENCE;
    const ID_FIELD: &'static str = "hid";
    type Domain = Hologram;

    fn from_domain(h: &Hologram) -> Self {
        let attachment = Attachment {
            content_type: non_empty(&h.content_type),
            url: None,
            size: h.file_size_in_kb.map(|kb| u64::from(kb) * BYTES_PER_KB),
            title: non_empty(&h.title),
        };
        let content = if attachment.is_empty() {
            Vec::new()
        } else {
            vec![Content {
                attachment: Some(attachment),
            }]
        };

        Self {
            resource_type: DOCUMENT_REFERENCE.to_string(),
            id: non_empty(&h.hid),
            status: Some("current".to_string()),
            date: h.creation_date,
            kind: non_empty(&h.creation_mode).map(|text| CodeableConcept { text: Some(text) }),
            content,
            description: HologramMeta::from_hologram(h).pack(),
            subject: non_empty(&h.pid).map(|pid| Reference::to(PATIENT, &pid)),
            author: non_empty(&h.aid)
                .map(|aid| vec![Reference::to(PRACTITIONER, &aid)])
                .unwrap_or_default(),
            extra: Default::default(),
        }
    }

    fn to_domain(&self) -> Hologram {
        let meta = HologramMeta::unpack(self.description.as_deref());
        let attachment = self.content.first().and_then(|c| c.attachment.as_ref());

        Hologram {
            hid: non_empty(&self.id),
            title: attachment.and_then(|a| non_empty(&a.title)),
            description: meta.description,
            content_type: attachment.and_then(|a| non_empty(&a.content_type)),
            file_size_in_kb: attachment.and_then(|a| a.size).map(bytes_to_kb),
            body_site: meta.body_site,
            date_of_imaging: meta.date_of_imaging,
            creation_date: self.date,
            creation_mode: self.kind.as_ref().and_then(|k| non_empty(&k.text)),
            creation_description: meta.creation_description,
            aid: self.author.first().and_then(|r| r.target_id(PRACTITIONER)),
            pid: self.subject.as_ref().and_then(|r| r.target_id(PATIENT)),
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn domain_id(domain: &Hologram) -> Option<&str> {
        domain.hid.as_deref()
    }
}

impl FhirResource for PatientResource {
    const RESOURCE_TYPE: &'static str = PATIENT;
    const ID_FIELD: &'static str = "pid";
    type Domain = Patient;

    fn from_domain(p: &Patient) -> Self {
        Self {
            resource_type: PATIENT.to_string(),
            id: non_empty(&p.pid),
            name: name_to_fhir(p.name.as_ref()),
            gender: non_empty(&p.gender),
            birth_date: non_empty(&p.birth_date),
            extra: Default::default(),
        }
    }

    fn to_domain(&self) -> Patient {
        Patient {
            pid: non_empty(&self.id),
            gender: non_empty(&self.gender),
            birth_date: non_empty(&self.birth_date),
            name: name_from_fhir(&self.name),
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn domain_id(domain: &Patient) -> Option<&str> {
        domain.pid.as_deref()
    }
}

impl FhirResource for Practitioner {
    const RESOURCE_TYPE: &'static str = PRACTITIONER;
    const ID_FIELD: &'static str = "aid";
    type Domain = Author;

    fn from_domain(a: &Author) -> Self {
        Self {
            resource_type: PRACTITIONER.to_string(),
            id: non_empty(&a.aid),
            name: name_to_fhir(a.name.as_ref()),
            extra: Default::default(),
        }
    }

    fn to_domain(&self) -> Author {
        Author {
            aid: non_empty(&self.id),
            name: name_from_fhir(&self.name),
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn domain_id(domain: &Author) -> Option<&str> {
        domain.aid.as_deref()
    }
}

/// Floor-divide a byte count into kilobytes, saturating at `u32::MAX`
fn bytes_to_kb(bytes: u64) -> u32 {
    u32::try_from(bytes / BYTES_PER_KB).unwrap_or(u32::MAX)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

fn name_to_fhir(name: Option<&PersonName>) -> Vec<HumanName> {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return Vec::new();
    };
    vec![HumanName {
        text: non_empty(&name.full),
        family: non_empty(&name.family),
        given: non_empty(&name.given).into_iter().collect(),
        prefix: non_empty(&name.title).into_iter().collect(),
    }]
}

fn name_from_fhir(names: &[HumanName]) -> Option<PersonName> {
    let name = names.first().filter(|n| !n.is_empty())?;
    let join = |parts: &[String]| {
        let joined = parts.join(" ");
        (!joined.is_empty()).then_some(joined)
    };
    Some(PersonName {
        title: join(&name.prefix),
        given: join(&name.given),
        family: non_empty(&name.family),
        full: non_empty(&name.text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    fn full_hologram() -> Hologram {
        Hologram {
            hid: Some("h-100".to_string()),
            title: Some("Lung scan".to_string()),
            description: Some("Left lung, segmented".to_string()),
            content_type: Some("model/gltf-binary".to_string()),
            file_size_in_kb: Some(2048),
            body_site: Some("lung".to_string()),
            date_of_imaging: Some(Utc.with_ymd_and_hms(2019, 11, 4, 9, 30, 0).unwrap()),
            creation_date: Some(Utc.with_ymd_and_hms(2020, 1, 15, 12, 0, 0).unwrap()),
            creation_mode: Some("GENERATE_FROM_IMAGING_STUDY".to_string()),
            creation_description: Some("lung segmentation pipeline".to_string()),
            aid: Some("a-7".to_string()),
            pid: Some("p-9".to_string()),
        }
    }

    #[test]
    fn test_hologram_round_trip() {
        let hologram = full_hologram();
        let resource = DocumentReference::from_domain(&hologram);
        assert_eq!(resource.to_domain(), hologram);
    }

    #[test]
    fn test_hologram_round_trip_through_json() {
        let hologram = full_hologram();
        let payload = serde_json::to_vec(&DocumentReference::from_domain(&hologram)).unwrap();
        let parsed: DocumentReference = parse_resource(&payload).unwrap();
        assert_eq!(parsed.to_domain(), hologram);
    }

    #[test]
    fn test_hologram_backend_shape() {
        let value = serde_json::to_value(DocumentReference::from_domain(&full_hologram())).unwrap();

        assert_eq!(value["resourceType"], "DocumentReference");
        assert_eq!(value["status"], "current");
        assert_eq!(value["type"]["text"], "GENERATE_FROM_IMAGING_STUDY");
        assert_eq!(value["subject"]["reference"], "Patient/p-9");
        assert_eq!(value["author"][0]["reference"], "Practitioner/a-7");
        assert_eq!(value["content"][0]["attachment"]["size"], 2048 * 1024);
        assert_eq!(value["content"][0]["attachment"]["title"], "Lung scan");

        let meta: serde_json::Value =
            serde_json::from_str(value["description"].as_str().unwrap()).unwrap();
        assert_eq!(meta["bodySite"], "lung");
        assert_eq!(meta["creationDescription"], "lung segmentation pipeline");
    }

    #[test]
    fn test_blank_hologram_emits_no_nested_structures() {
        let value = serde_json::to_value(DocumentReference::from_domain(&Hologram::default())).unwrap();
        assert_eq!(
            value,
            json!({"resourceType": "DocumentReference", "status": "current"})
        );
    }

    #[test]
    fn test_empty_strings_treated_as_absent() {
        let hologram = Hologram {
            pid: Some(String::new()),
            aid: Some(String::new()),
            title: Some(String::new()),
            ..Default::default()
        };
        let resource = DocumentReference::from_domain(&hologram);
        assert!(resource.subject.is_none());
        assert!(resource.author.is_empty());
        assert!(resource.content.is_empty());
    }

    #[rstest]
    #[case(1, 1024)]
    #[case(0, 0)]
    #[case(4096, 4096 * 1024)]
    #[case(u32::MAX, u64::from(u32::MAX) * 1024)]
    fn test_size_written_in_bytes(#[case] kb: u32, #[case] bytes: u64) {
        let hologram = Hologram {
            file_size_in_kb: Some(kb),
            ..Default::default()
        };
        let resource = DocumentReference::from_domain(&hologram);
        let size = resource.content[0].attachment.as_ref().unwrap().size;
        assert_eq!(size, Some(bytes));
        assert_eq!(resource.to_domain().file_size_in_kb, Some(kb));
    }

    #[rstest]
    #[case(1023, 0)]
    #[case(1024, 1)]
    #[case(2047, 1)]
    #[case(u64::MAX, u32::MAX)]
    fn test_size_read_floors(#[case] bytes: u64, #[case] kb: u32) {
        let resource = DocumentReference {
            resource_type: "DocumentReference".to_string(),
            content: vec![Content {
                attachment: Some(Attachment {
                    size: Some(bytes),
                    ..Default::default()
                }),
            }],
            ..Default::default()
        };
        assert_eq!(resource.to_domain().file_size_in_kb, Some(kb));
    }

    #[test]
    fn test_malformed_meta_yields_blank_fields() {
        let resource = DocumentReference {
            resource_type: "DocumentReference".to_string(),
            id: Some("h1".to_string()),
            description: Some("not json {".to_string()),
            kind: Some(CodeableConcept {
                text: Some("UPLOADED".to_string()),
            }),
            ..Default::default()
        };

        let hologram = resource.to_domain();
        assert_eq!(hologram.hid.as_deref(), Some("h1"));
        assert_eq!(hologram.creation_mode.as_deref(), Some("UPLOADED"));
        assert!(hologram.description.is_none());
        assert!(hologram.body_site.is_none());
        assert!(hologram.date_of_imaging.is_none());
        assert!(hologram.creation_description.is_none());
    }

    #[test]
    fn test_raw_references_without_prefix() {
        let resource: DocumentReference = serde_json::from_value(json!({
            "resourceType": "DocumentReference",
            "subject": {"reference": "p-raw"},
            "author": [{"reference": "Practitioner/a-1"}, {"reference": "Practitioner/a-2"}]
        }))
        .unwrap();

        let hologram = resource.to_domain();
        assert_eq!(hologram.pid.as_deref(), Some("p-raw"));
        assert_eq!(hologram.aid.as_deref(), Some("a-1"));
    }

    #[test]
    fn test_set_attachment_url() {
        let mut resource = DocumentReference::from_domain(&full_hologram());
        resource.set_attachment_url("https://store/h-100.glb").unwrap();
        assert_eq!(resource.attachment_url(), Some("https://store/h-100.glb"));
        // URL is not part of the domain record
        assert_eq!(resource.to_domain(), full_hologram());

        let mut empty = DocumentReference::from_domain(&Hologram::default());
        assert!(matches!(
            empty.set_attachment_url("x"),
            Err(TranslateError::MissingContent)
        ));
    }

    #[test]
    fn test_parse_resource_checks_type() {
        let err = parse_resource::<DocumentReference>(br#"{"resourceType":"Patient","id":"x"}"#)
            .unwrap_err();
        assert!(matches!(err, TranslateError::WrongResourceType { .. }));

        let err = parse_resource::<PatientResource>(b"<html>").unwrap_err();
        assert!(matches!(err, TranslateError::Malformed { .. }));
    }

    #[test]
    fn test_resource_from_bundle_entry() {
        let entry = json!({"resourceType": "DocumentReference", "id": "h9", "type": {"text": "UPLOADED"}});
        let resource: DocumentReference = resource_from_value(entry).unwrap();
        assert_eq!(resource.to_domain().creation_mode.as_deref(), Some("UPLOADED"));

        let err = resource_from_value::<DocumentReference>(json!({"resourceType": "Patient"})).unwrap_err();
        assert!(matches!(err, TranslateError::WrongResourceType { .. }));
        let err = resource_from_value::<DocumentReference>(json!({"id": "h9"})).unwrap_err();
        assert!(matches!(err, TranslateError::Malformed { .. }));
    }

    #[test]
    fn test_patient_round_trip() {
        let patient = Patient {
            pid: Some("p-1".to_string()),
            gender: Some("female".to_string()),
            birth_date: Some("1867-11-07".to_string()),
            name: Some(PersonName {
                title: Some("Dr".to_string()),
                given: Some("Marie".to_string()),
                family: Some("Curie".to_string()),
                full: Some("Dr Marie Curie".to_string()),
            }),
        };

        let resource = PatientResource::from_domain(&patient);
        assert_eq!(resource.name.len(), 1);
        assert_eq!(resource.name[0].prefix, vec!["Dr".to_string()]);
        assert_eq!(resource.to_domain(), patient);
    }

    #[test]
    fn test_empty_name_is_omitted() {
        let author = Author {
            aid: Some("a-1".to_string()),
            name: Some(PersonName::default()),
        };
        let resource = Practitioner::from_domain(&author);
        assert!(resource.name.is_empty());
        assert_eq!(resource.to_domain().name, None);
    }

    #[test]
    fn test_practitioner_reads_first_name_only() {
        let resource: Practitioner = serde_json::from_value(json!({
            "resourceType": "Practitioner",
            "id": "a-2",
            "name": [
                {"given": ["Rosalind", "Elsie"], "family": "Franklin"},
                {"text": "R. Franklin"}
            ]
        }))
        .unwrap();

        let author = resource.to_domain();
        assert_eq!(author.aid.as_deref(), Some("a-2"));
        let name = author.name.unwrap();
        assert_eq!(name.given.as_deref(), Some("Rosalind Elsie"));
        assert_eq!(name.family.as_deref(), Some("Franklin"));
        assert_eq!(name.full, None);
    }

    fn text() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-zA-Z0-9 ._-]{1,24}")
    }

    fn timestamp() -> impl Strategy<Value = Option<DateTime<Utc>>> {
        proptest::option::of(
            (0i64..4_102_444_800).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap()),
        )
    }

    prop_compose! {
        fn hologram()(
            hid in text(), title in text(), description in text(),
            content_type in text(), file_size_in_kb in proptest::option::of(any::<u32>()),
            body_site in text(), date_of_imaging in timestamp(), creation_date in timestamp(),
            creation_mode in text(), creation_description in text(),
            aid in "[a-z0-9-]{1,12}".prop_map(Some), pid in "[a-z0-9-]{1,12}".prop_map(Some),
        ) -> Hologram {
            Hologram {
                hid, title, description, content_type, file_size_in_kb, body_site,
                date_of_imaging, creation_date, creation_mode, creation_description, aid, pid,
            }
        }
    }

    proptest! {
        #[test]
        fn prop_hologram_round_trip(h in hologram()) {
            let payload = serde_json::to_vec(&DocumentReference::from_domain(&h)).unwrap();
            let parsed: DocumentReference = parse_resource(&payload).unwrap();
            prop_assert_eq!(parsed.to_domain(), h);
        }

        #[test]
        fn prop_size_read_is_floor(bytes in 0u64..(u64::from(u32::MAX) * 1024)) {
            prop_assert_eq!(u64::from(bytes_to_kb(bytes)), bytes / 1024);
        }
    }
}
