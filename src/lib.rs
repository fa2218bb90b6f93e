//! # HoloStorage
//!
//! Umbrella crate for the HoloStorage accessor workspace.
//!
//! - [`holo_core`]: domain records and FHIR translation
//! - [`holo_fhir`]: batched and paginated FHIR backend access
//! - [`holo_blobstore`]: hologram binary storage
//! - [`holo_gateway`]: the `/api/v1` REST gateway

pub use holo_blobstore;
pub use holo_core;
pub use holo_fhir;
pub use holo_gateway;

pub use holo_gateway::{run_server_with_shutdown, GatewayConfig};
