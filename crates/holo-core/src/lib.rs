//! # Holo Core
//!
//! Record types and schema translation for the HoloStorage accessor.
//!
//! This crate provides:
//! - **Domain records**: the flat `Hologram`, `Patient` and `Author` shapes
//!   served by the public REST API
//! - **Resource records**: the nested FHIR `DocumentReference`,
//!   `Patient` and `Practitioner` shapes stored in the backend
//! - **Translation**: total, stateless mapping in both directions
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  from_domain()   ┌──────────────────────┐
//! │   Hologram   │ ───────────────▶ │  DocumentReference   │
//! │   Patient    │                  │  PatientResource     │
//! │   Author     │ ◀─────────────── │  Practitioner        │
//! └──────────────┘   to_domain()    └──────────────────────┘
//! ```
//!
//! Hologram fields the backend has no slot for travel as a JSON string in
//! `DocumentReference.description`; unknown backend fields are kept in each
//! resource's `extra` map so a read-modify-write does not drop them.

pub mod domain;
pub mod error;
pub mod resource;
pub mod translate;

pub use domain::{Author, Hologram, Patient, PersonName};
pub use error::{Result, TranslateError};
pub use resource::{
    Attachment, CodeableConcept, Content, DocumentReference, HumanName, PatientResource,
    Practitioner, Reference,
};
pub use translate::{parse_resource, resource_from_value, FhirResource, HologramMeta};

/// File extension used for stored hologram binaries
pub const HOLOGRAM_EXTENSION: &str = "glb";

/// Bytes per kilobyte for attachment size conversion
pub const BYTES_PER_KB: u64 = 1024;
