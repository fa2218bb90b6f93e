//! HTTP object storage client
//!
//! Objects are addressed path-style as `{endpoint}/{container}/{key}`.
//! Uploads carry `x-ms-blob-type: BlockBlob` so Azure-compatible services
//! accept them; plain object stores ignore the header.

use crate::{validate_key, BlobStore, BlobStoreError, Result, DEFAULT_CONTAINER};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Configuration for an HTTP object store
#[derive(Clone, Debug)]
pub struct HttpBlobStoreConfig {
    /// Service endpoint, e.g. `http://localhost:10000/devstoreaccount1`
    pub endpoint: String,
    /// Container holding the objects
    pub container: String,
    /// Bearer token sent with every request
    pub access_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for HttpBlobStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:10000".to_string(),
            container: DEFAULT_CONTAINER.to_string(),
            access_token: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl HttpBlobStoreConfig {
    /// Create with a custom endpoint
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the container
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    /// Set the access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

/// HTTP object store client
#[derive(Clone)]
pub struct HttpBlobStore {
    client: Client,
    base: Url,
    config: HttpBlobStoreConfig,
}

impl HttpBlobStore {
    /// Create a new HTTP object store
    pub fn new(config: HttpBlobStoreConfig) -> Result<Self> {
        let base = Url::parse(&config.endpoint)
            .map_err(|e| BlobStoreError::Configuration(format!("invalid endpoint: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(BlobStoreError::Configuration(format!(
                "'{}' cannot be used as an endpoint",
                config.endpoint
            )));
        }
        validate_key(&config.container)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BlobStoreError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &HttpBlobStoreConfig {
        &self.config
    }

    fn object_url(&self, key: &str) -> Url {
        let mut url = self.base.clone();
        // Checked in new(): the endpoint always has path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(&self.config.container).push(key);
        }
        url
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn check(&self, key: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(BlobStoreError::NotFound(key.to_string()));
        }
        let message = response.text().await.unwrap_or_default();
        Err(BlobStoreError::Service {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<String> {
        validate_key(key)?;
        let url = self.object_url(key);
        debug!(%url, "Uploading object");

        let req = self
            .client
            .put(url.clone())
            .header(header::CONTENT_TYPE, content_type)
            .header("x-ms-blob-type", "BlockBlob")
            .body(data);
        let response = self.authorize(req).send().await?;
        self.check(key, response).await?;
        Ok(url.into())
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Bytes> {
        validate_key(key)?;
        let req = self.client.get(self.object_url(key));
        let response = self.authorize(req).send().await?;
        let response = self.check(key, response).await?;
        Ok(response.bytes().await?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let req = self.client.delete(self.object_url(key));
        let response = self.authorize(req).send().await?;
        self.check(key, response).await?;
        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        self.object_url(key).into()
    }
}
