//! Fetching candidate requests from the site API.
//!
//! One GET per relay cycle, returning the complete current backlog as a JSON
//! array. The fetcher never fails upward: any transport problem (connect
//! error, timeout, non-2xx status, undecodable body) is logged and reported
//! as an empty batch, so the relay loop always makes progress. Malformed
//! elements are passed through unchanged; validation belongs to the loop.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::types::RawRequest;

const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Internal transport failure taxonomy. Surfaces only in warn logs; callers
/// of [`RequestSource::fetch_batch`] see an empty batch instead.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("source returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Supplies the current batch of candidate requests.
pub trait RequestSource {
    /// Fetches the current batch. Must not fail: implementations report
    /// transport problems via logs and yield an empty batch.
    fn fetch_batch(&self) -> impl Future<Output = Vec<RawRequest>> + Send;
}

/// HTTP implementation of [`RequestSource`] against the configured site API.
#[derive(Clone)]
pub struct HttpRequestSource {
    client: reqwest::Client,
    url: String,
}

impl HttpRequestSource {
    /// Creates a source with a client configured with connect/request timeouts.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(build_http_client(), url)
    }

    /// Creates a source with a caller-supplied client.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        HttpRequestSource {
            client,
            url: url.into(),
        }
    }

    async fn fetch_once(&self) -> Result<Vec<RawRequest>, SourceError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status));
        }
        Ok(response.json().await?)
    }
}

impl RequestSource for HttpRequestSource {
    async fn fetch_batch(&self) -> Vec<RawRequest> {
        match self.fetch_once().await {
            Ok(batch) => batch,
            Err(error) => {
                warn!(url = %self.url, error = %error, "failed to fetch requests; treating as empty batch");
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for HttpRequestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRequestSource")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

fn build_http_client() -> reqwest::Client {
    match reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .build()
    {
        Ok(client) => client,
        Err(error) => {
            warn!(error = %error, "failed to build HTTP client with timeouts; falling back to defaults");
            reqwest::Client::new()
        }
    }
}
