use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and validates a configuration file
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored in the crawl checkpoint so a resume against a changed
/// configuration can be detected.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its content hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_CONFIG: &str = r#"
[crawler]
concurrency-limit = 2
request-delay-seconds = 0.5
retry-budget = 3
robots-policy = "obey"

[user-agent]
crawler-name = "Catwalk"
crawler-version = "0.1"
contact-url = "https://example.com/about"
contact-email = "ops@example.com"

[site]
start-url = "https://example.com/collections/tops"
reviews-endpoint = "https://reviews.example.com/v3/storefront"
store-id = "abc123"

[output]
directory = "./output"
formats = ["jsonl", "csv"]
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.concurrency_limit, 2);
        assert_eq!(config.site.store_id, "abc123");
        assert_eq!(config.output.formats.len(), 2);
    }

    #[test]
    fn rejects_invalid_toml() {
        let file = create_temp_config("this is not toml [[[");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn hash_is_stable_for_same_content() {
        let a = create_temp_config(VALID_CONFIG);
        let b = create_temp_config(VALID_CONFIG);
        assert_eq!(
            compute_config_hash(a.path()).unwrap(),
            compute_config_hash(b.path()).unwrap()
        );
    }

    #[test]
    fn hash_changes_when_content_changes() {
        let a = create_temp_config(VALID_CONFIG);
        let b = create_temp_config(&VALID_CONFIG.replace("abc123", "def456"));
        assert_ne!(
            compute_config_hash(a.path()).unwrap(),
            compute_config_hash(b.path()).unwrap()
        );
    }
}
