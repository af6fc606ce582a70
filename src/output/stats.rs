//! Batch statistics over harvested sites
//!
//! A read-only metrics surface for the benchmarking layer. Statistics are
//! derived purely from the returned `SiteResult`s.

use crate::output::aggregate::SiteResult;
use crate::output::record::ErrorKind;
use std::collections::HashMap;
use std::time::Duration;

/// Batch summary statistics
#[derive(Debug, Clone, Default)]
pub struct BatchStatistics {
    /// Number of sites in the batch
    pub sites: usize,

    /// Sites that produced no URLs and at least one error
    pub sites_failed: usize,

    /// Unique URLs summed over all sites
    pub total_urls: usize,

    /// Sitemap documents fetched over all sites
    pub total_sitemaps: usize,

    /// Requests issued over all sites, including robots.txt
    pub total_requests: usize,

    /// Recorded node errors over all sites
    pub total_errors: usize,

    /// Error counts by kind label
    pub errors_by_kind: HashMap<&'static str, usize>,

    /// Sites that fell back to the default sitemap location
    pub robots_fallbacks: usize,

    /// Longest single-site elapsed time
    pub slowest_site: Duration,
}

impl BatchStatistics {
    /// Fraction of sites that produced at least one URL
    pub fn success_rate(&self) -> f64 {
        if self.sites == 0 {
            return 0.0;
        }
        (self.sites - self.sites_failed) as f64 / self.sites as f64
    }
}

/// Computes batch statistics from site results
pub fn summarize(results: &[SiteResult]) -> BatchStatistics {
    let mut stats = BatchStatistics {
        sites: results.len(),
        ..BatchStatistics::default()
    };

    for result in results {
        if result.is_total_failure() {
            stats.sites_failed += 1;
        }
        stats.total_urls += result.urls_found();
        stats.total_sitemaps += result.sitemaps_fetched;
        stats.total_requests += result.total_requests;
        stats.total_errors += result.error_count();

        for error in &result.errors {
            *stats.errors_by_kind.entry(error.kind.label()).or_insert(0) += 1;
        }

        if result.robots.as_ref().is_some_and(|r| r.used_fallback()) {
            stats.robots_fallbacks += 1;
        }

        stats.slowest_site = stats.slowest_site.max(result.elapsed);
    }

    stats
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &BatchStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Sites: {}", stats.sites);
    println!("  Unique URLs: {}", stats.total_urls);
    println!("  Sitemaps fetched: {}", stats.total_sitemaps);
    println!("  Total requests: {}", stats.total_requests);
    println!("  robots.txt fallbacks: {}", stats.robots_fallbacks);
    println!("  Slowest site: {:.2}s", stats.slowest_site.as_secs_f64());
    println!();

    if !stats.errors_by_kind.is_empty() {
        println!("Error Summary ({}):", stats.total_errors);
        let mut error_counts: Vec<_> = stats.errors_by_kind.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (kind, count) in error_counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} sites produced URLs)",
        stats.success_rate() * 100.0,
        stats.sites - stats.sites_failed,
        stats.sites
    );
}

/// Counts errors of a given kind across results
pub fn count_errors(results: &[SiteResult], kind: ErrorKind) -> usize {
    results
        .iter()
        .flat_map(|r| r.errors.iter())
        .filter(|e| e.kind == kind)
        .count()
}
