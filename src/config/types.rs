use crate::robots::RobotsPolicy;
use serde::Deserialize;

/// Main configuration structure for catwalk
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub site: SiteConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Global cap on in-flight requests across all pipeline stages
    #[serde(rename = "concurrency-limit", default = "default_concurrency_limit")]
    pub concurrency_limit: u32,

    /// Minimum delay between the start of successive requests (seconds),
    /// measured globally, not per stage
    #[serde(
        rename = "request-delay-seconds",
        default = "default_request_delay_seconds"
    )]
    pub request_delay_seconds: f64,

    /// Retry attempts for transient transport failures before escalating
    #[serde(rename = "retry-budget", default = "default_retry_budget")]
    pub retry_budget: u32,

    /// Whether to honor the site's robots.txt
    #[serde(rename = "robots-policy", default)]
    pub robots_policy: RobotsPolicy,
}

fn default_concurrency_limit() -> u32 {
    1
}

fn default_request_delay_seconds() -> f64 {
    3.0
}

fn default_retry_budget() -> u32 {
    3
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Composes the full user agent string sent with every request
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Target catalog configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// First listing page of the catalog walk
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Base URL of the review-count API
    #[serde(rename = "reviews-endpoint")]
    pub reviews_endpoint: String,

    /// Store identifier baked into every review-count request
    #[serde(rename = "store-id")]
    pub store_id: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving all export files
    pub directory: String,

    /// Export encodings produced from the one record stream
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,

    /// Path to the crawl checkpoint file
    #[serde(rename = "checkpoint-path", default = "default_checkpoint_path")]
    pub checkpoint_path: String,

    /// Path to the discovered-URL handoff file shared between the two stages
    #[serde(rename = "seed-file", default = "default_seed_file")]
    pub seed_file: String,
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Jsonl]
}

fn default_checkpoint_path() -> String {
    "./output/checkpoint.json".to_string()
}

fn default_seed_file() -> String {
    "./output/item_urls.jl".to_string()
}

/// Supported export encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    Jsonl,
    /// A single JSON array
    Json,
    /// One row per record
    Csv,
}

impl OutputFormat {
    /// File name used for this format inside the output directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Jsonl => "records.jl",
            Self::Json => "records.json",
            Self::Csv => "records.csv",
        }
    }
}
