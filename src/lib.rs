//! Sitemap-Harvest: a bounded sitemap discovery engine
//!
//! This crate discovers the URL inventory of a batch of websites by resolving
//! `robots.txt` sitemap declarations and recursively decoding sitemap and
//! sitemap-index documents. All network fetches across the batch share one
//! concurrency bound, and each site's traversal is limited by depth, fanout,
//! and a total sitemap budget.

pub mod config;
pub mod harvester;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sitemap-Harvest operations
///
/// These errors are only raised before any fetch begins. Failures of
/// individual sitemap nodes are recorded in the [`output::SiteResult`]
/// instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Concurrency governor was closed")]
    GovernorClosed,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Sitemap-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::{Config, HarvesterConfig, SiteTarget};
pub use harvester::{Fetch, Governor, Harvester, HttpFetcher};
pub use output::{ErrorKind, SiteResult, UrlRecord};
pub use state::{NodeKind, NodeState, SitemapNode, TraversalContext};
pub use url::{canonicalize_url, normalize_base_url};
