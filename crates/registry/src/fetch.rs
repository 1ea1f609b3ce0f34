use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Errors from fetching a page for a test run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// A transport-level error occurred (DNS, connect, TLS, reset).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status code.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The response body exceeded the configured size limit.
    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

/// A fetched page, ready to be parsed.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects.
    pub url: Url,
    /// HTTP status code of the final response.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

/// Capability to retrieve a page over the network.
///
/// One call is one attempt: implementations must not retry or cache.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError>;
}

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Total time allowed for connecting, sending, and reading the body.
    pub timeout: Duration,
    /// Largest response body accepted, in bytes.
    pub max_body_bytes: usize,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_body_bytes: 5 * 1024 * 1024,
            user_agent: concat!("spider-admin/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// [`Fetcher`] backed by a shared `reqwest::Client`.
pub struct HttpFetcher {
    config: FetchConfig,
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose client applies the configured timeout and
    /// user agent to every request.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn map_transport(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.config.timeout)
        } else {
            FetchError::Http(e)
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        let limit = self.config.max_body_bytes;

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        if response
            .content_length()
            .is_some_and(|len| usize::try_from(len).map_or(true, |len| len > limit))
        {
            return Err(FetchError::BodyTooLarge { limit });
        }

        let final_url = response.url().clone();

        // Chunked bodies carry no length up front; stop reading at the cap.
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_transport(e))? {
            if bytes.len() + chunk.len() > limit {
                return Err(FetchError::BodyTooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(status = status.as_u16(), bytes = bytes.len(), "page fetched");

        Ok(Page {
            url: final_url,
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}
