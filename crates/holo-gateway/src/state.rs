//! Application state

use crate::config::GatewayConfig;
use crate::orchestrator::Orchestrator;
use holo_blobstore::{BlobStore, FlexibleBlobStore};
use holo_fhir::FhirClient;
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Gateway operations
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Create a new application state from configuration
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let blob_store = FlexibleBlobStore::from_config(config.blob_config(), &config.blob_container)?;

        if blob_store.is_persistent() {
            info!("Storage mode: object store (persistent)");
        } else {
            warn!("Storage mode: in-memory (NOT persistent - for development only)");
        }

        Self::with_blob_store(config, Arc::new(blob_store))
    }

    /// Create a new application state over a given object store
    pub fn with_blob_store(
        config: GatewayConfig,
        blob_store: Arc<dyn BlobStore>,
    ) -> anyhow::Result<Self> {
        let fhir = FhirClient::new(config.fhir_config())?;
        info!(fhir_url = %config.fhir_url, "FHIR backend configured");

        Ok(Self {
            orchestrator: Orchestrator::new(fhir, blob_store),
            config,
        })
    }
}
