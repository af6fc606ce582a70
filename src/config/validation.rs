use crate::config::types::{Config, HarvesterConfig, SiteEntry, UserAgentConfig};
use crate::url::normalize_base_url;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvester_config(&config.harvester)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_sites(&config.site)?;
    Ok(())
}

/// Validates the traversal limits
///
/// This is also run at the start of every batch, so a malformed limit fails
/// the whole call before any request is sent.
pub fn validate_harvester_config(config: &HarvesterConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be >= 1, got {}",
            config.max_concurrent
        )));
    }

    if config.max_sitemaps < 1 {
        return Err(ConfigError::Validation(format!(
            "max_sitemaps must be >= 1, got {}",
            config.max_sitemaps
        )));
    }

    // max_depth >= 0 is always true for usize, so no check needed

    if config.max_fanout_per_level < 1 {
        return Err(ConfigError::Validation(format!(
            "max_fanout_per_level must be >= 1, got {}",
            config.max_fanout_per_level
        )));
    }

    if !config.timeout_seconds.is_finite() || config.timeout_seconds <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "timeout_seconds must be a positive number, got {}",
            config.timeout_seconds
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates the site list
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    for entry in sites {
        normalize_base_url(&entry.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid base URL '{}': {}", entry.base_url, e))
        })?;
    }
    Ok(())
}
