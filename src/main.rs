//! Sitemap-Harvest main entry point
//!
//! This is the command-line interface for the Sitemap-Harvest discovery engine.

use anyhow::{bail, Context};
use clap::Parser;
use sitemap_harvest::config::{load_config_with_hash, validate, Config};
use sitemap_harvest::output::{print_statistics, summarize, SiteResult};
use sitemap_harvest::Harvester;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sitemap-Harvest: a bounded sitemap discovery engine
///
/// Sitemap-Harvest resolves each site's robots.txt sitemap declarations,
/// walks sitemap indexes within depth, fanout, and sitemap budgets, and
/// reports the discovered URL inventory per site.
#[derive(Parser, Debug)]
#[command(name = "sitemap-harvest")]
#[command(version)]
#[command(about = "A bounded sitemap discovery engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Site base URL to harvest (repeatable, added to the config's sites)
    #[arg(long = "site", value_name = "URL")]
    sites: Vec<String>,

    /// Sitemap URL to traverse directly, skipping robots.txt (repeatable)
    #[arg(long = "sitemap", value_name = "URL", conflicts_with = "sites")]
    sitemaps: Vec<String>,

    /// Override the global concurrent request limit
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Override the per-site sitemap budget
    #[arg(long)]
    max_sitemaps: Option<usize>,

    /// Override the maximum index depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Override the per-index fanout limit
    #[arg(long)]
    max_fanout: Option<usize>,

    /// Override the per-request timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Print results as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    let harvester = Harvester::new(config.harvester, &config.user_agent)?;

    let results = if cli.sitemaps.is_empty() {
        let mut sites = config.base_urls();
        sites.extend(cli.sites.iter().cloned());
        if sites.is_empty() {
            bail!("No sites to harvest: pass --site or list [[site]] entries in the config");
        }
        harvester.harvest_batch(&sites).await
    } else {
        vec![harvester.harvest_sitemaps(&cli.sitemaps).await]
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if !cli.quiet {
        print_results(&results);
        print_statistics(&summarize(&results));
        println!(
            "Peak concurrent requests: {} / {}",
            harvester.governor().peak_in_flight(),
            harvester.governor().capacity()
        );
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_harvest=info,warn"),
            1 => EnvFilter::new("sitemap_harvest=debug,info"),
            2 => EnvFilter::new("sitemap_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Applies command-line limit overrides on top of the loaded config
fn apply_overrides(config: &mut Config, cli: &Cli) {
    let harvester = &mut config.harvester;
    if let Some(value) = cli.max_concurrent {
        harvester.max_concurrent = value;
    }
    if let Some(value) = cli.max_sitemaps {
        harvester.max_sitemaps = value;
    }
    if let Some(value) = cli.max_depth {
        harvester.max_depth = value;
    }
    if let Some(value) = cli.max_fanout {
        harvester.max_fanout_per_level = value;
    }
    if let Some(value) = cli.timeout {
        harvester.timeout_seconds = value;
    }
}

fn print_results(results: &[SiteResult]) {
    println!("=== Sites ===\n");
    for result in results {
        println!(
            "{}: {} URLs, {} sitemaps, {} errors ({:.2}s)",
            result.base_url,
            result.urls_found(),
            result.sitemaps_fetched,
            result.error_count(),
            result.elapsed_secs()
        );
        if let Some(robots) = &result.robots {
            println!("  robots.txt: {}", robots.fetch_status.note());
        }
        for error in &result.errors {
            println!("  ✗ {}", error);
        }
        for note in &result.notes {
            println!("  · {}", note);
        }
    }
    println!();
}
