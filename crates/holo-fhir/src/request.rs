//! Correlated request descriptors and their results

use crate::{FhirError, Result};
use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// One backend request, keyed by a caller-chosen id inside a batch
#[derive(Clone, Debug)]
pub struct FhirRequest {
    pub method: Method,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl FhirRequest {
    fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            body: None,
        }
    }

    /// GET request
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// DELETE request
    pub fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// PUT request with a JSON body
    pub fn put(url: Url, body: Value) -> Self {
        Self::new(Method::PUT, url).with_body(body)
    }

    /// POST request with a JSON body
    pub fn post(url: Url, body: Value) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    /// Add a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Outcome of one request in a batch
///
/// Either `error` is set (no HTTP exchange completed) or `status` and
/// `payload` are, whatever the status class.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FhirResult {
    pub id: String,
    pub status: Option<u16>,
    pub payload: Option<Bytes>,
    pub error: Option<String>,
}

impl FhirResult {
    /// Result of a completed HTTP exchange
    pub fn response(id: impl Into<String>, status: u16, payload: Bytes) -> Self {
        Self {
            id: id.into(),
            status: Some(status),
            payload: Some(payload),
            error: None,
        }
    }

    /// Result of a request that never got a response
    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: None,
            payload: None,
            error: Some(error.into()),
        }
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| (200..300).contains(&s))
    }

    /// Check for 404 or 410
    pub fn is_gone(&self) -> bool {
        matches!(self.status, Some(404 | 410))
    }

    /// Payload of a 2xx response, or the failure as an error
    pub fn into_payload(self) -> Result<Bytes> {
        if let Some(error) = self.error {
            return Err(FhirError::Transport(error));
        }
        let payload = self.payload.unwrap_or_default();
        match self.status {
            Some(status) if (200..300).contains(&status) => Ok(payload),
            Some(status) => Err(FhirError::Status {
                status,
                body: String::from_utf8_lossy(&payload).into_owned(),
            }),
            None => Err(FhirError::Transport(format!(
                "request '{}' produced no response",
                self.id
            ))),
        }
    }
}
