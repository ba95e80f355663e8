use crate::config::UserAgentConfig;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Transport-level fetch failure
///
/// None of these is fatal at this layer; the retry policy decides which are
/// worth another attempt and the caller decides what exhaustion means.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

impl FetchError {
    /// True for failures worth retrying: timeouts, connection failures,
    /// 5xx, and 429. Other statuses (404 and friends) escalate immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed(_) => true,
            Self::HttpStatus(code) => *code >= 500 || *code == 429,
        }
    }
}

/// Builds the HTTP client shared by every pipeline stage
///
/// User agent: `name/version (+contact-url; contact-email)`. Redirects are
/// followed with reqwest's default limit; compressed bodies are accepted.
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues one GET and returns the response body
///
/// Does not rate-limit or retry; callers go through
/// [`fetch_with_retry`](super::fetch_with_retry) instead of calling this
/// directly.
pub async fn fetch(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await.map_err(classify_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    response.text().await.map_err(classify_error)
}

fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = e.status() {
        FetchError::HttpStatus(status.as_u16())
    } else {
        FetchError::ConnectionFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "Catwalk".to_string(),
            crawler_version: "0.1".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "ops@example.com".to_string(),
        }
    }

    #[test]
    fn builds_client() {
        assert!(build_http_client(&test_config()).is_ok());
    }

    #[test]
    fn transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::ConnectionFailed("refused".into()).is_transient());
        assert!(FetchError::HttpStatus(500).is_transient());
        assert!(FetchError::HttpStatus(503).is_transient());
        assert!(FetchError::HttpStatus(429).is_transient());
        assert!(!FetchError::HttpStatus(404).is_transient());
        assert!(!FetchError::HttpStatus(403).is_transient());
    }
}
