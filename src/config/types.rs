use serde::Deserialize;
use std::time::Duration;

/// Default number of in-flight fetches across a batch
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Default number of sitemap documents fetched per site
pub const DEFAULT_MAX_SITEMAPS: usize = 10;

/// Default number of index hops below a root sitemap
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Default number of children scheduled per sitemap index
pub const DEFAULT_MAX_FANOUT_PER_LEVEL: usize = 5;

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 30.0;

/// Main configuration structure for Sitemap-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harvester: HarvesterConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub site: Vec<SiteEntry>,
}

impl Config {
    /// Returns the configured base URLs in file order
    pub fn base_urls(&self) -> Vec<String> {
        self.site.iter().map(|s| s.base_url.clone()).collect()
    }
}

/// Traversal budgets and limits applied to every site of a run
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HarvesterConfig {
    /// Maximum number of in-flight fetches across the whole batch
    #[serde(rename = "max-concurrent", default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Maximum number of sitemap documents fetched for one site
    #[serde(rename = "max-sitemaps", default = "default_max_sitemaps")]
    pub max_sitemaps: usize,

    /// Maximum index depth; robots-derived sitemaps sit at depth 0
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum number of direct children scheduled per sitemap index
    #[serde(rename = "max-fanout-per-level", default = "default_max_fanout")]
    pub max_fanout_per_level: usize,

    /// Timeout applied to each individual request
    #[serde(rename = "timeout-seconds", default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
}

impl HarvesterConfig {
    /// Returns the per-request timeout as a Duration
    ///
    /// Invalid values (which validation rejects) fall back to the default.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECONDS))
    }
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_sitemaps: DEFAULT_MAX_SITEMAPS,
            max_depth: DEFAULT_MAX_DEPTH,
            max_fanout_per_level: DEFAULT_MAX_FANOUT_PER_LEVEL,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

fn default_max_sitemaps() -> usize {
    DEFAULT_MAX_SITEMAPS
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_fanout() -> usize {
    DEFAULT_MAX_FANOUT_PER_LEVEL
}

fn default_timeout_seconds() -> f64 {
    DEFAULT_TIMEOUT_SECONDS
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SitemapHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/sitemap-harvest".to_string(),
        }
    }
}

/// A site listed in the configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Base URL of the site (scheme optional, `https://` is assumed)
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// One site to harvest together with the run's limits
///
/// Immutable for the duration of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteTarget {
    pub base_url: String,
    pub config: HarvesterConfig,
}

impl SiteTarget {
    pub fn new(base_url: impl Into<String>, config: HarvesterConfig) -> Self {
        Self {
            base_url: base_url.into(),
            config,
        }
    }
}
