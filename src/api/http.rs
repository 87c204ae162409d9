//! HTTP backend using the PhantomFirewall REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;

use super::{Backend, Endpoint, FetchError};

/// Fetches payloads from a running firewall API over HTTP.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use phantom_dash::{Backend, Endpoint, HttpBackend};
///
/// # tokio_test::block_on(async {
/// let backend = HttpBackend::new("http://127.0.0.1:8080", Duration::from_secs(3)).unwrap();
/// let body = backend.fetch(Endpoint::Status).await;
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    description: String,
}

impl HttpBackend {
    /// Create a backend rooted at `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let description = format!("api: {}", base_url);
        Ok(Self {
            client,
            base_url,
            description,
        })
    }

    /// Full URL for an endpoint.
    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch(&self, endpoint: Endpoint) -> Result<Vec<u8>, FetchError> {
        let url = self.url(endpoint);
        trace!(%url, "GET");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Protocol(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
