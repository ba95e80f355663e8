use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency_limit < 1 || config.concurrency_limit > 16 {
        return Err(ConfigError::Validation(format!(
            "concurrency-limit must be between 1 and 16, got {}",
            config.concurrency_limit
        )));
    }

    if !config.request_delay_seconds.is_finite() || config.request_delay_seconds < 0.0 {
        return Err(ConfigError::Validation(format!(
            "request-delay-seconds must be a non-negative number, got {}",
            config.request_delay_seconds
        )));
    }

    if config.retry_budget > 10 {
        return Err(ConfigError::Validation(format!(
            "retry-budget must be <= 10, got {}",
            config.retry_budget
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let start = Url::parse(&config.start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("invalid start-url: {}", e)))?;
    if start.scheme() != "http" && start.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start-url must be http(s), got scheme '{}'",
            start.scheme()
        )));
    }

    Url::parse(&config.reviews_endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("invalid reviews-endpoint: {}", e)))?;

    if config.store_id.is_empty() {
        return Err(ConfigError::Validation(
            "store-id cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.formats.is_empty() {
        return Err(ConfigError::Validation(
            "at least one output format is required".to_string(),
        ));
    }

    if config.checkpoint_path.is_empty() || config.seed_file.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint-path and seed-file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email shape check: something@something.something
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
    });

    if valid {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "contact-email does not look like an email address: '{}'",
            email
        )))
    }
}
