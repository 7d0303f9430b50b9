use crate::config::types::{Config, CrawlerConfig, OutputConfig, SessionConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_session_config(&config.session)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.checkpoint_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "checkpoint_interval_secs must be >= 1".to_string(),
        ));
    }

    if config.retry_backoff_factor < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_backoff_factor must be >= 1, got {}",
            config.retry_backoff_factor
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.blocking_threads < 1 {
        return Err(ConfigError::Validation(
            "blocking_threads must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates session configuration
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.site_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "site_marker cannot be empty".to_string(),
        ));
    }

    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent cannot be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if let Some(dir) = &config.sitemap_directory {
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "sitemap_directory cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}
