//! # Holo Gateway
//!
//! REST gateway for hologram, patient and author metadata.
//!
//! This crate provides:
//! - **REST API**: the `/api/v1` surface for lookups, uploads and deletes
//! - **Orchestration**: multi-step operations over the FHIR backend and the
//!   object store, with typed failures
//! - **Rate Limiting**: per-client request throttling
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! │          (HoloRepository UI, scripts, curl)         │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                   Holo Gateway                      │
//! ├─────────────────────────────────────────────────────┤
//! │  Request ID │ Rate Limiter │ Multipart Parser       │
//! ├─────────────────────────────────────────────────────┤
//! │               GatewayOrchestrator                   │
//! │   (lookup, mass lookup, create, delete, download)   │
//! ├──────────────────────────┬──────────────────────────┤
//! │  holo-core + holo-fhir   │     holo-blobstore       │
//! │  (translation, batches)  │   (hologram binaries)    │
//! └──────────────────────────┴──────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod orchestrator;
pub mod routes;
pub mod server;
pub mod state;
pub mod upload;

pub use config::GatewayConfig;
pub use error::{ApiError, CreateStep, ErrorBody};
pub use orchestrator::{CreatedHologram, Download, NewHologram, Orchestrator, RelationLookup};
pub use server::run_server_with_shutdown;
pub use state::AppState;

/// Base path of every API route
pub const API_BASE: &str = "/api/v1";
