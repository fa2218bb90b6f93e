//! # Holo FHIR
//!
//! Client for the FHIR backend behind the HoloStorage accessor.
//!
//! ## Features
//!
//! - **Batch execution**: fan a set of correlated requests out concurrently
//!   and get exactly one result back per id, whatever fails
//! - **Pagination**: follow bundle `next` links per id until every chain is
//!   exhausted, flagging ids whose chain broke early
//! - **Bounded concurrency**: one semaphore per client caps in-flight requests
//!
//! ## Example
//!
//! ```rust,ignore
//! use holo_fhir::{FhirClient, FhirConfig, FhirRequest};
//! use std::collections::HashMap;
//!
//! let client = FhirClient::new(FhirConfig::new("http://localhost:8080/fhir"))?;
//!
//! let mut batch = HashMap::new();
//! for pid in ["p1", "p2"] {
//!     batch.insert(pid.to_string(), FhirRequest::get(client.instance_url("Patient", pid)?));
//! }
//! let results = client.execute_batch(batch).await;
//! assert_eq!(results.len(), 2);
//! ```

mod batch;
mod bundle;
mod client;
mod config;
mod crawler;
mod error;
mod request;

pub use bundle::{Bundle, BundleEntry, BundleLink};
pub use client::FhirClient;
pub use config::FhirConfig;
pub use crawler::CrawlOutcome;
pub use error::{FhirError, Result};
pub use request::{FhirRequest, FhirResult};
