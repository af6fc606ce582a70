//! Harvester module: concurrent sitemap discovery
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching behind a pluggable `Fetch` trait
//! - A concurrency governor shared by every request in a batch
//! - Sitemap XML decoding
//! - Recursive sitemap traversal with depth, fanout, and sitemap budgets
//! - Batch orchestration producing one `SiteResult` per site

mod decoder;
mod fetcher;
mod governor;
mod traverser;

pub use decoder::{decode, DecodedDocument, SitemapEntry};
pub use fetcher::{build_http_client, fetch_gated, Fetch, FetchError, FetchedBody, HttpFetcher};
pub use governor::{Governor, GovernorSlot};
pub use traverser::SitemapTraverser;

use crate::config::{validate_harvester_config, HarvesterConfig, SiteTarget, UserAgentConfig};
use crate::output::{ErrorKind, NodeError, ResultAggregator, SiteResult};
use crate::robots::RobotsResolver;
use crate::url::{canonicalize_url, normalize_base_url};
use futures::future::join_all;
use std::sync::Arc;
use url::Url;

/// Harvests the URL inventory of a batch of sites
///
/// One harvester owns one [`Governor`]; every robots.txt and sitemap fetch
/// issued through it, across all sites, shares the same concurrency bound.
#[derive(Clone)]
pub struct Harvester {
    resolver: RobotsResolver,
    traverser: SitemapTraverser,
    governor: Governor,
    config: HarvesterConfig,
}

impl Harvester {
    /// Creates a harvester that fetches over HTTP
    ///
    /// # Errors
    ///
    /// Fails before any network activity if the configuration is invalid
    /// or the HTTP client cannot be built.
    pub fn new(config: HarvesterConfig, user_agent: &UserAgentConfig) -> crate::Result<Self> {
        validate_harvester_config(&config)?;
        let fetcher = HttpFetcher::from_config(user_agent, config.timeout())?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Creates a harvester around a custom [`Fetch`] implementation
    pub fn with_fetcher(
        config: HarvesterConfig,
        fetcher: Arc<dyn Fetch>,
    ) -> crate::Result<Self> {
        validate_harvester_config(&config)?;

        let governor = Governor::new(config.max_concurrent);
        let resolver = RobotsResolver::new(Arc::clone(&fetcher), governor.clone(), config.timeout());
        let traverser = SitemapTraverser::new(fetcher, governor.clone());

        Ok(Self {
            resolver,
            traverser,
            governor,
            config,
        })
    }

    /// The governor shared by all of this harvester's fetches
    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    pub fn config(&self) -> &HarvesterConfig {
        &self.config
    }

    /// Harvests one site starting from its robots.txt
    ///
    /// Never fails: an unusable base URL produces a result with a single
    /// `InvalidUrl` error and no fetches.
    pub async fn harvest_site(&self, base_url: &str) -> SiteResult {
        let target = SiteTarget::new(base_url, self.config);
        let mut aggregator = ResultAggregator::new(&target);

        let base = match normalize_base_url(base_url) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!("Skipping invalid base URL {:?}: {}", base_url, e);
                aggregator.record_error(NodeError::new(
                    base_url,
                    0,
                    ErrorKind::InvalidUrl,
                    e.to_string(),
                ));
                return aggregator.finish();
            }
        };

        tracing::info!("Harvesting {}", base);
        let robots = self.resolver.resolve(&base).await;
        let candidates = robots.candidates.clone();
        aggregator.record_robots(robots);

        self.traverser
            .traverse(&target, &candidates, &mut aggregator)
            .await;

        let result = aggregator.finish();
        tracing::info!(
            "Finished {}: {} URLs from {} sitemaps, {} errors in {:.2}s",
            result.base_url,
            result.urls_found(),
            result.sitemaps_fetched,
            result.error_count(),
            result.elapsed_secs()
        );
        result
    }

    /// Harvests a batch of sites concurrently
    ///
    /// Results are returned in input order, one per base URL.
    pub async fn harvest_batch(&self, base_urls: &[String]) -> Vec<SiteResult> {
        tracing::info!(
            "Harvesting {} sites (max {} concurrent requests)",
            base_urls.len(),
            self.governor.capacity()
        );
        join_all(base_urls.iter().map(|base_url| self.harvest_site(base_url))).await
    }

    /// Traverses known sitemap URLs directly, skipping robots.txt
    ///
    /// The result's base URL is the origin of the first sitemap.
    pub async fn harvest_sitemaps(&self, sitemap_urls: &[String]) -> SiteResult {
        let base_url = sitemap_urls
            .first()
            .and_then(|first| Url::parse(first.trim()).ok())
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_default();

        let target = SiteTarget::new(base_url, self.config);
        let mut aggregator = ResultAggregator::new(&target);

        let mut roots = Vec::new();
        for sitemap_url in sitemap_urls {
            match Url::parse(sitemap_url.trim()) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {
                    roots.push(canonicalize_url(url.as_str()))
                }
                _ => aggregator.record_error(NodeError::new(
                    sitemap_url.as_str(),
                    0,
                    ErrorKind::InvalidUrl,
                    "sitemap URL must be an absolute http(s) URL",
                )),
            }
        }

        self.traverser
            .traverse(&target, &roots, &mut aggregator)
            .await;
        aggregator.finish()
    }
}

/// Harvests a batch of sites with the default HTTP fetcher
///
/// This is the main entry point. Invalid configuration is the only failure
/// and is reported before any request is made.
///
/// # Example
///
/// ```no_run
/// use sitemap_harvest::config::{HarvesterConfig, UserAgentConfig};
/// use sitemap_harvest::harvester::harvest;
///
/// # async fn run() -> Result<(), sitemap_harvest::HarvestError> {
/// let sites = vec!["https://example.com".to_string()];
/// let results = harvest(&sites, HarvesterConfig::default(), &UserAgentConfig::default()).await?;
/// println!("{} URLs", results[0].urls_found());
/// # Ok(())
/// # }
/// ```
pub async fn harvest(
    base_urls: &[String],
    config: HarvesterConfig,
    user_agent: &UserAgentConfig,
) -> crate::Result<Vec<SiteResult>> {
    let harvester = Harvester::new(config, user_agent)?;
    Ok(harvester.harvest_batch(base_urls).await)
}
