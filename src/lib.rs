//! Catwalk: a polite catalog crawl pipeline
//!
//! This crate implements a three-stage crawl of a single product catalog:
//! paginated discovery of item URLs, per-item structured extraction from
//! detail pages, and per-item enrichment via a dependent review-count API
//! call. The whole run respects a global politeness budget, survives
//! per-item failures, and checkpoints listing progress so an interrupted
//! discovery can resume.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for catwalk operations
#[derive(Debug, Error)]
pub enum CatwalkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Sink error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error(
        "Seed file not found: {path}. Run the discovery stage first \
         (`catwalk <config> --stage discover`) to produce it."
    )]
    SeedFileMissing { path: String },

    #[error("Seed file entry malformed at line {line}: {message}")]
    SeedFileMalformed { line: usize, message: String },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for catwalk operations
pub type Result<T> = std::result::Result<T, CatwalkError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{CrawlState, ItemRecord, RecordStatus};
pub use url::normalize_url;
