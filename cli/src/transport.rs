//! HTTP transport backed by reqwest

use async_trait::async_trait;
use recipebook_core::{
    ClientConfig, Method, RecipebookError, RecipebookResult, Transport, TransportError,
    TransportResult,
};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// [`Transport`] talking JSON over HTTP
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> RecipebookResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RecipebookError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self::with_client(&config.api_url, client))
    }

    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> TransportResult {
        let url = self.url(path);

        let mut builder = self.client.request(http_method(method), &url);
        if let Some(body) = &body {
            builder = builder.json(body);
        }
        let request = builder
            .build()
            .map_err(|e| TransportError::client(e.to_string()))?;

        debug!("{} {}", method, url);
        let response = self.client.execute(request).await.map_err(classify)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(classify)?;

        if !status.is_success() {
            return Err(TransportError::server(
                Some(status.as_u16()),
                failure_message(status, &bytes),
            ));
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::client(format!("malformed response: {}", e)))
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Requests that never left the process are client-side, everything else
/// (refused connections, timeouts, broken bodies) is server-side.
fn classify(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::client(err.to_string())
    } else {
        TransportError::server(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

/// `error` field of a JSON error body, else the reason phrase
fn failure_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string())
}
