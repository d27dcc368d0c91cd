use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::warn;

use crate::ai::completion::CompletionRequest;
use crate::config::RelaySettings;
use crate::error::RelayError;

/// Delivers a serialized request and hands back the raw response body.
///
/// Anything that keeps the body from arriving (no connection, timeout,
/// non-2xx status) is a [`RelayError::Transport`]. Interpreting the body is
/// the caller's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &CompletionRequest) -> Result<String, RelayError>;
}

/// `reqwest`-backed transport for a fixed endpoint and bearer token.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Setup(e.to_string()))?;

        Ok(Self::with_client(client, endpoint, api_key))
    }

    /// Use a caller-configured `reqwest` client (proxies, TLS roots, timeouts).
    pub fn with_client(
        client: Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_settings(settings: &RelaySettings) -> Result<Self, RelayError> {
        Self::new(&settings.endpoint, &settings.api_key, settings.timeout)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &CompletionRequest) -> Result<String, RelayError> {
        let response = self.client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::transport(format!("request to {} timed out", self.endpoint))
                } else {
                    RelayError::transport(format!("request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!("Completion endpoint returned {status}: {text}");
            return Err(RelayError::transport(format!("endpoint returned {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| RelayError::transport(format!("could not read response body: {e}")))
    }
}
