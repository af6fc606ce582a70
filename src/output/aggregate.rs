//! Result aggregation for a single site
//!
//! The aggregator is the only owner of a site's accumulated state while the
//! traversal runs. Node outcomes can arrive in any order; merging is a set
//! union keyed by canonical URL, so the final result does not depend on
//! completion order.

use crate::config::SiteTarget;
use crate::output::record::{BudgetNote, NodeError, UrlRecord};
use crate::robots::RobotsResult;
use crate::state::NodeOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Terminal aggregate for one site
///
/// Always produced, even when every fetch failed: failure shows up as an
/// empty URL list plus populated `errors`.
#[derive(Debug, Clone, Serialize)]
pub struct SiteResult {
    /// The base URL as it was requested
    pub base_url: String,

    /// robots.txt discovery outcome (absent for direct sitemap harvesting)
    pub robots: Option<RobotsResult>,

    /// Deduplicated records, sorted by canonical URL
    pub urls: Vec<UrlRecord>,

    /// Number of sitemap documents fetched (robots.txt excluded)
    pub sitemaps_fetched: usize,

    /// Total requests issued, including robots.txt
    pub total_requests: usize,

    /// Failed nodes, ordered by depth then URL
    pub errors: Vec<NodeError>,

    /// Budget notes, ordered by depth then URL
    pub notes: Vec<BudgetNote>,

    /// Wall-clock start of the site's run
    pub started_at: DateTime<Utc>,

    /// Elapsed wall time of the site's run
    pub elapsed: Duration,
}

impl SiteResult {
    /// Number of unique URLs found
    pub fn urls_found(&self) -> usize {
        self.urls.len()
    }

    /// Number of recorded errors
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if the site produced no URLs and at least one error
    pub fn is_total_failure(&self) -> bool {
        self.urls.is_empty() && !self.errors.is_empty()
    }

    /// Returns true if the canonical form of `url` is in the result
    pub fn contains_url(&self, url: &str) -> bool {
        let canonical = crate::url::canonicalize_url(url);
        self.urls
            .binary_search_by(|r| r.url.as_str().cmp(canonical.as_str()))
            .is_ok()
    }

    /// Elapsed wall time in fractional seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Incrementally merges node outcomes into a [`SiteResult`]
#[derive(Debug)]
pub struct ResultAggregator {
    base_url: String,
    robots: Option<RobotsResult>,
    records: BTreeMap<String, UrlRecord>,
    sitemaps_fetched: usize,
    robots_requests: usize,
    errors: Vec<NodeError>,
    notes: Vec<BudgetNote>,
    started_at: DateTime<Utc>,
    start: Instant,
}

impl ResultAggregator {
    /// Starts aggregating for a site; the elapsed clock starts now
    pub fn new(target: &SiteTarget) -> Self {
        Self {
            base_url: target.base_url.clone(),
            robots: None,
            records: BTreeMap::new(),
            sitemaps_fetched: 0,
            robots_requests: 0,
            errors: Vec::new(),
            notes: Vec::new(),
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    /// Records the robots.txt discovery outcome (one request)
    pub fn record_robots(&mut self, robots: RobotsResult) {
        self.robots_requests += 1;
        self.robots = Some(robots);
    }

    /// Records an error that is not tied to a fetched node
    pub fn record_error(&mut self, error: NodeError) {
        self.errors.push(error);
    }

    /// Records an informational budget note
    pub fn record_note(&mut self, note: BudgetNote) {
        self.notes.push(note);
    }

    /// Merges one node's outcome
    ///
    /// Every outcome corresponds to exactly one sitemap fetch attempt.
    pub fn absorb(&mut self, outcome: NodeOutcome) {
        self.sitemaps_fetched += 1;

        for record in outcome.records {
            self.insert_record(record);
        }

        if let Some(error) = outcome.error {
            self.errors.push(error);
        }

        self.notes.extend(outcome.notes);
    }

    fn insert_record(&mut self, record: UrlRecord) {
        match self.records.get_mut(&record.url) {
            Some(existing) => {
                if record.preference_key() < existing.preference_key() {
                    *existing = record;
                }
            }
            None => {
                self.records.insert(record.url.clone(), record);
            }
        }
    }

    /// Number of unique URLs merged so far
    pub fn urls_found(&self) -> usize {
        self.records.len()
    }

    /// Finalizes the result and stops the elapsed clock
    pub fn finish(mut self) -> SiteResult {
        self.errors
            .sort_by(|a, b| (a.depth, &a.url).cmp(&(b.depth, &b.url)));
        self.notes
            .sort_by(|a, b| (a.depth, &a.url).cmp(&(b.depth, &b.url)));

        SiteResult {
            base_url: self.base_url,
            robots: self.robots,
            urls: self.records.into_values().collect(),
            sitemaps_fetched: self.sitemaps_fetched,
            total_requests: self.sitemaps_fetched + self.robots_requests,
            errors: self.errors,
            notes: self.notes,
            started_at: self.started_at,
            elapsed: self.start.elapsed(),
        }
    }
}

/// Merges a complete set of node outcomes for one site
pub fn aggregate<I>(target: &SiteTarget, outcomes: I) -> SiteResult
where
    I: IntoIterator<Item = NodeOutcome>,
{
    let mut aggregator = ResultAggregator::new(target);
    for outcome in outcomes {
        aggregator.absorb(outcome);
    }
    aggregator.finish()
}
