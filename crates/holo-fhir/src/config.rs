//! Client configuration

use std::time::Duration;

/// Default cap on in-flight backend requests per client
pub const DEFAULT_MAX_CONCURRENCY: usize = 64;

/// FHIR client configuration
#[derive(Clone, Debug)]
pub struct FhirConfig {
    /// Base URL of the FHIR REST API, e.g. `http://localhost:8080/fhir`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum number of requests in flight at once
    pub max_concurrency: usize,
    /// Stop crawling after this many rounds, `None` for no limit
    pub max_pagination_rounds: Option<usize>,
    /// User agent string
    pub user_agent: String,
}

impl Default for FhirConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/fhir".to_string(),
            timeout: Duration::from_secs(30),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_pagination_rounds: None,
            user_agent: format!("holo-fhir/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FhirConfig {
    /// Create a new config with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the concurrency bound
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Cap the number of pagination rounds
    pub fn with_max_pagination_rounds(mut self, rounds: usize) -> Self {
        self.max_pagination_rounds = Some(rounds);
        self
    }
}
