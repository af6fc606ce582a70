//! HTTP fetcher implementation
//!
//! This module handles every network request the harvester makes:
//! - The `Fetch` trait, the seam between traversal logic and transport
//! - `HttpFetcher`, the reqwest-backed implementation
//! - Governor-gated fetching with a per-request timeout
//! - Error classification into network, timeout, and HTTP status failures
//!
//! There is no automatic retry: each URL is requested exactly once.

use crate::config::UserAgentConfig;
use crate::harvester::governor::Governor;
use crate::output::ErrorKind;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// A successfully fetched response body
#[derive(Debug, Clone)]
pub struct FetchedBody {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Raw response bytes
    pub body: Vec<u8>,
}

/// Failure of a single fetch, captured as data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
}

impl FetchError {
    /// Maps this failure onto the recorded error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::HttpStatus { status, .. } => ErrorKind::HttpStatus(*status),
        }
    }

    /// Returns true for an HTTP 404 response
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpStatus { status, .. } if *status == StatusCode::NOT_FOUND.as_u16())
    }
}

/// A single bounded GET request
///
/// Implementations know nothing about sitemaps. Timeouts and concurrency
/// limits are applied by the caller through [`fetch_gated`].
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedBody, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout
///
/// # Example
///
/// ```no_run
/// use sitemap_harvest::config::UserAgentConfig;
/// use sitemap_harvest::harvester::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(30))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetch`] implementation
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher around a configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a fetcher with a client built from the user agent config
    pub fn from_config(config: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config, timeout)?))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    /// Fetches a URL and classifies the outcome
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | HTTP 2xx | `Ok(FetchedBody)` |
    /// | Other HTTP status | `HttpStatus` |
    /// | Timeout (request or body) | `Timeout` |
    /// | DNS / connect / TLS / body error | `Network` |
    async fn fetch(&self, url: &str) -> Result<FetchedBody, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e))?;

        Ok(FetchedBody {
            final_url,
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: format!("Connection failed: {}", error),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Fetches `url` while holding one governor slot
///
/// The slot is acquired before the request starts and released when this
/// future completes or is dropped, whatever the outcome. The timeout
/// covers the request only, not the wait for a slot.
pub async fn fetch_gated(
    fetcher: &dyn Fetch,
    governor: &Governor,
    url: &str,
    timeout: Duration,
) -> Result<FetchedBody, FetchError> {
    let _slot = governor.acquire().await.map_err(|e| FetchError::Network {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    tracing::debug!("Fetching {}", url);
    match tokio::time::timeout(timeout, fetcher.fetch(url)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
        }),
    }
}
