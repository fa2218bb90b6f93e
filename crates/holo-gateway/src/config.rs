//! Gateway configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `HOLO_*` environment variables (e.g. `HOLO_FHIR_URL`). The binary applies
//! command-line overrides on top.

use config::{Config, ConfigError, Environment, File, FileFormat};
use holo_blobstore::{HttpBlobStoreConfig, DEFAULT_CONTAINER};
use holo_fhir::FhirConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Gateway server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// FHIR backend base URL
    pub fhir_url: String,
    /// Object store endpoint; in-memory storage when unset
    pub blob_endpoint: Option<String>,
    /// Object store container for hologram binaries
    pub blob_container: String,
    /// Object store bearer token
    pub blob_access_token: Option<String>,
    /// Use in-memory storage (for testing/development)
    pub use_memory_store: bool,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// Rate limit (requests per second per client)
    pub rate_limit_rps: u32,
    /// Maximum backend requests in flight
    pub max_concurrency: usize,
    /// Cap on bundle pages followed per id
    pub max_pagination_rounds: Option<usize>,
    /// Backend request timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3200,
            fhir_url: "http://localhost:8080/fhir".to_string(),
            blob_endpoint: None,
            blob_container: DEFAULT_CONTAINER.to_string(),
            blob_access_token: None,
            use_memory_store: false,
            cors_enabled: true,
            max_body_size: 256 * 1024 * 1024, // 256 MB
            rate_limit_rps: 100,
            max_concurrency: holo_fhir::FhirConfig::default().max_concurrency,
            max_pagination_rounds: None,
            request_timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Load defaults, an optional TOML file and `HOLO_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        builder
            .add_source(Environment::with_prefix("HOLO").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// FHIR client settings
    pub fn fhir_config(&self) -> FhirConfig {
        let mut config = FhirConfig::new(&self.fhir_url)
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_max_concurrency(self.max_concurrency);
        config.max_pagination_rounds = self.max_pagination_rounds;
        config
    }

    /// Object store settings, `None` when holograms stay in memory
    pub fn blob_config(&self) -> Option<HttpBlobStoreConfig> {
        if self.use_memory_store {
            return None;
        }
        let endpoint = self.blob_endpoint.as_deref().filter(|e| !e.is_empty())?;
        let mut config = HttpBlobStoreConfig::with_endpoint(endpoint)
            .with_container(&self.blob_container);
        if let Some(token) = &self.blob_access_token {
            config = config.with_token(token);
        }
        Some(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3200");
        assert_eq!(config.max_concurrency, 64);
        assert!(config.blob_config().is_none());
    }

    #[test]
    fn test_blob_config() {
        let mut config = GatewayConfig {
            blob_endpoint: Some("http://blob.test".to_string()),
            blob_access_token: Some("token".to_string()),
            ..Default::default()
        };
        let blob = config.blob_config().unwrap();
        assert_eq!(blob.endpoint, "http://blob.test");
        assert_eq!(blob.container, "holograms");
        assert_eq!(blob.access_token.as_deref(), Some("token"));

        config.use_memory_store = true;
        assert!(config.blob_config().is_none());
    }

    #[test]
    fn test_fhir_config() {
        let config = GatewayConfig {
            fhir_url: "http://fhir.test".to_string(),
            max_pagination_rounds: Some(5),
            request_timeout_secs: 7,
            ..Default::default()
        };
        let fhir = config.fhir_config();
        assert_eq!(fhir.base_url, "http://fhir.test");
        assert_eq!(fhir.max_pagination_rounds, Some(5));
        assert_eq!(fhir.timeout, Duration::from_secs(7));
    }

    // Environment variables are process-wide, so every layer is checked in
    // one test
    #[test]
    fn test_load_layers() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "port = 8081\nfhir_url = \"http://hapi.test/fhir\"\nmax_pagination_rounds = 10"
        )
        .unwrap();

        std::env::set_var("HOLO_RATE_LIMIT_RPS", "7");
        let config = GatewayConfig::load(Some(file.path())).unwrap();
        std::env::remove_var("HOLO_RATE_LIMIT_RPS");

        assert_eq!(config.port, 8081);
        assert_eq!(config.fhir_url, "http://hapi.test/fhir");
        assert_eq!(config.max_pagination_rounds, Some(10));
        assert_eq!(config.rate_limit_rps, 7);
        // Untouched fields keep their defaults
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.blob_container, "holograms");

        assert!(GatewayConfig::load(Some(Path::new("/nonexistent/holo.toml"))).is_err());
    }
}
