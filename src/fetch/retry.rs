use super::client::{fetch, FetchError};
use super::limiter::RateLimiter;
use reqwest::Client;
use std::time::Duration;

/// Capped exponential backoff for transient transport failures
///
/// | Failure              | Action                                  |
/// |----------------------|-----------------------------------------|
/// | Timeout              | retry up to the budget                  |
/// | Connection failed    | retry up to the budget                  |
/// | HTTP 5xx / 429       | retry up to the budget                  |
/// | Any other HTTP error | escalate immediately                    |
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub budget: u32,
    /// Backoff before retry n is `base * 2^n`, capped
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Fetches a URL under the global rate limit, retrying transient failures
///
/// Each attempt (including retries) takes its own rate-limiter slot, so
/// retries still respect the politeness budget. Returns the last error once
/// the budget is exhausted or immediately for non-transient failures.
pub async fn fetch_with_retry(
    client: &Client,
    limiter: &RateLimiter,
    policy: &RetryPolicy,
    url: &str,
) -> Result<String, FetchError> {
    let mut attempt = 0;

    loop {
        let slot = limiter.acquire().await;
        let result = fetch(client, url).await;
        drop(slot);

        match result {
            Ok(body) => return Ok(body),
            Err(e) if e.is_transient() && attempt < policy.budget => {
                let wait = policy.backoff(attempt);
                attempt += 1;
                tracing::warn!(
                    "transient failure fetching {} (attempt {}/{}): {}; retrying in {:?}",
                    url,
                    attempt,
                    policy.budget,
                    e,
                    wait
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> Client {
        Client::builder().build().unwrap()
    }

    fn fast_policy(budget: u32) -> RetryPolicy {
        RetryPolicy {
            budget,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            budget: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(500));
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn succeeds_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let limiter = RateLimiter::new(1, Duration::ZERO);
        let body = fetch_with_retry(
            &test_client(),
            &limiter,
            &fast_policy(3),
            &format!("{}/page", server.uri()),
        )
        .await
        .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn retries_transient_500_until_budget_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3) // first attempt + 2 retries
            .mount(&server)
            .await;

        let limiter = RateLimiter::new(1, Duration::ZERO);
        let result = fetch_with_retry(
            &test_client(),
            &limiter,
            &fast_policy(2),
            &format!("{}/flaky", server.uri()),
        )
        .await;

        assert!(matches!(result, Err(FetchError::HttpStatus(500))));
    }

    #[tokio::test]
    async fn does_not_retry_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let limiter = RateLimiter::new(1, Duration::ZERO);
        let result = fetch_with_retry(
            &test_client(),
            &limiter,
            &fast_policy(3),
            &format!("{}/gone", server.uri()),
        )
        .await;

        assert!(matches!(result, Err(FetchError::HttpStatus(404))));
    }
}
