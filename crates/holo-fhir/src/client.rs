//! Main client implementation

use crate::{FhirConfig, FhirError, FhirRequest, FhirResult, Result};
use reqwest::{header, Client};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, instrument};
use url::Url;

const FHIR_JSON: &str = "application/fhir+json";

/// FHIR backend client
///
/// Cheap to clone; clones share the HTTP connection pool and the
/// concurrency bound.
#[derive(Clone)]
pub struct FhirClient {
    config: Arc<FhirConfig>,
    base: Url,
    http: Client,
    permits: Arc<Semaphore>,
}

impl FhirClient {
    /// Create a new client with the given configuration
    pub fn new(config: FhirConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)?;
        if base.cannot_be_a_base() {
            return Err(FhirError::Config(format!(
                "'{}' cannot be used as a base URL",
                config.base_url
            )));
        }
        if config.max_concurrency == 0 {
            return Err(FhirError::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(FHIR_JSON));

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            permits: Arc::new(Semaphore::new(config.max_concurrency)),
            config: Arc::new(config),
            base,
            http,
        })
    }

    /// Create with base URL
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::new(FhirConfig::new(base_url))
    }

    /// Get the configuration
    pub fn config(&self) -> &FhirConfig {
        &self.config
    }

    /// URL of a resource type, e.g. `{base}/Patient`
    pub fn type_url(&self, resource_type: &str) -> Url {
        self.url_with_segments(&[resource_type])
    }

    /// URL of a resource instance, e.g. `{base}/Patient/{id}`
    ///
    /// The id is percent-encoded as a single path segment.
    pub fn instance_url(&self, resource_type: &str, id: &str) -> Url {
        self.url_with_segments(&[resource_type, id])
    }

    /// Resolve a bundle link against the base URL; absolute links are kept
    pub fn resolve(&self, link: &str) -> Result<Url> {
        Ok(self.base.join(link)?)
    }

    fn url_with_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in new(): the base URL always has path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Execute a single request
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn execute_one(&self, request: FhirRequest) -> FhirResult {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => return FhirResult::failed("", e.to_string()),
        };
        self.send("", request).await
    }

    /// Send without taking a permit; callers hold one
    pub(crate) async fn send(&self, id: &str, request: FhirRequest) -> FhirResult {
        let FhirRequest {
            method,
            url,
            query,
            body,
        } = request;

        let mut req = self.http.request(method.clone(), url.clone());
        if !query.is_empty() {
            req = req.query(&query);
        }
        if let Some(body) = body {
            req = req.header(header::CONTENT_TYPE, FHIR_JSON).json(&body);
        }

        debug!(id, %method, %url, "Sending backend request");
        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => return FhirResult::failed(id, e.to_string()),
        };

        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(payload) => FhirResult::response(id, status, payload),
            Err(e) => FhirResult::failed(id, format!("failed to read response body: {e}")),
        }
    }

    pub(crate) fn permits(&self) -> Arc<Semaphore> {
        Arc::clone(&self.permits)
    }
}
