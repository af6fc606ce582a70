//! Robots.txt handling module
//!
//! This module resolves a site's candidate sitemap URLs from its robots.txt.
//! Resolution never fails: when robots.txt is unavailable or declares no
//! sitemaps, the conventional `/sitemap.xml` location is used instead.

mod parser;

pub use parser::parse_sitemap_directives;

use crate::harvester::{fetch_gated, Fetch, FetchError, Governor};
use crate::output::ErrorKind;
use crate::url::site_root;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// How the robots.txt fetch went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RobotsFetchStatus {
    /// Fetched with a 2xx response
    Fetched { status: u16 },

    /// The site has no robots.txt (HTTP 404); not an error
    NotFound,

    /// Any other failure, kept as an informational note
    Failed { kind: ErrorKind, message: String },
}

impl RobotsFetchStatus {
    /// Short human-readable description
    pub fn note(&self) -> String {
        match self {
            Self::Fetched { status } => format!("fetched (HTTP {})", status),
            Self::NotFound => "not found".to_string(),
            Self::Failed { kind, message } => format!("{}: {}", kind, message),
        }
    }
}

/// Outcome of robots.txt discovery for one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RobotsResult {
    /// The robots.txt URL that was requested
    pub robots_url: String,

    /// `Sitemap:` declarations found, in file order
    pub directives: Vec<String>,

    /// Root sitemap URLs to traverse; never empty
    pub candidates: Vec<String>,

    pub fetch_status: RobotsFetchStatus,
}

impl RobotsResult {
    /// Returns true if the candidates are the `/sitemap.xml` fallback
    pub fn used_fallback(&self) -> bool {
        self.directives.is_empty()
    }
}

/// Returns `{base}/sitemap.xml`
pub fn fallback_sitemap_url(base: &Url) -> String {
    format!("{}/sitemap.xml", site_root(base))
}

/// Returns `{base}/robots.txt`
pub fn robots_url(base: &Url) -> String {
    format!("{}/robots.txt", site_root(base))
}

/// Resolves candidate sitemap URLs for a site
#[derive(Clone)]
pub struct RobotsResolver {
    fetcher: Arc<dyn Fetch>,
    governor: Governor,
    timeout: Duration,
}

impl RobotsResolver {
    pub fn new(fetcher: Arc<dyn Fetch>, governor: Governor, timeout: Duration) -> Self {
        Self {
            fetcher,
            governor,
            timeout,
        }
    }

    /// Fetches and parses robots.txt for `base`
    ///
    /// The fetch goes through the governor like every other request. Any
    /// failure, including a 404, yields the fallback candidate.
    pub async fn resolve(&self, base: &Url) -> RobotsResult {
        let robots_url = robots_url(base);

        let (directives, fetch_status) =
            match fetch_gated(self.fetcher.as_ref(), &self.governor, &robots_url, self.timeout)
                .await
            {
                Ok(fetched) => {
                    let content = String::from_utf8_lossy(&fetched.body);
                    // Relative declarations resolve against the final robots.txt URL
                    let directive_base = Url::parse(&fetched.final_url).unwrap_or_else(|_| base.clone());
                    (
                        parse_sitemap_directives(&content, &directive_base),
                        RobotsFetchStatus::Fetched {
                            status: fetched.status,
                        },
                    )
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!("No robots.txt at {}", robots_url);
                    (Vec::new(), RobotsFetchStatus::NotFound)
                }
                Err(e) => {
                    tracing::info!("robots.txt unavailable for {}: {}", base, e);
                    (Vec::new(), failed_status(&e))
                }
            };

        let candidates = if directives.is_empty() {
            vec![fallback_sitemap_url(base)]
        } else {
            directives.clone()
        };

        tracing::debug!(
            "{} sitemap candidate(s) for {} ({})",
            candidates.len(),
            base,
            fetch_status.note()
        );

        RobotsResult {
            robots_url,
            directives,
            candidates,
            fetch_status,
        }
    }
}

fn failed_status(error: &FetchError) -> RobotsFetchStatus {
    RobotsFetchStatus::Failed {
        kind: error.kind(),
        message: error.to_string(),
    }
}
