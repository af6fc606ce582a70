//! Configuration module for Sitemap-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitemap_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvester will use max depth: {}", config.harvester.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, HarvesterConfig, SiteEntry, SiteTarget, UserAgentConfig, DEFAULT_MAX_CONCURRENT,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_FANOUT_PER_LEVEL, DEFAULT_MAX_SITEMAPS,
    DEFAULT_TIMEOUT_SECONDS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

pub use validation::{validate, validate_harvester_config};
