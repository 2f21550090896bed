//! HTTP fetcher
//!
//! Plain GET of a URL, returning the response body as text.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{FetchError, Fetcher};

// == Http Fetcher ==
/// Fetches resources by URL with a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                resource: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, resource_id: &str) -> Result<String, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            resource: resource_id.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(resource_id).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                resource: resource_id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        debug!(url = resource_id, bytes = body.len(), "fetched resource");
        Ok(body)
    }
}
