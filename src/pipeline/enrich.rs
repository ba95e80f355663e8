//! Enrichment stage: the dependent review-count call
//!
//! Consumes records in `EnrichmentPending`, asks the review API for the
//! count keyed by the product ID from the detail page, and completes the
//! record. This stage is best-effort by design: the base product data is
//! valuable without review counts, so every failure here — transport,
//! status, parse, missing path — degrades to `review_count = 0` and never
//! fails the record.

use crate::fetch::{fetch_with_retry, RateLimiter, RetryPolicy};
use crate::state::{ItemRecord, RecordStatus};
use reqwest::Client;

/// Extracts `pagination.total` from a review API response body
///
/// Returns None when the body is not JSON or the path is missing; callers
/// default to 0.
pub fn parse_review_count(body: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.pointer("/pagination/total")?.as_u64()
}

/// Issues review-count calls and completes records
pub struct Enricher {
    client: Client,
    limiter: RateLimiter,
    retry: RetryPolicy,
    endpoint: String,
    store_id: String,
}

impl Enricher {
    pub fn new(
        client: Client,
        limiter: RateLimiter,
        retry: RetryPolicy,
        endpoint: String,
        store_id: String,
    ) -> Self {
        Self {
            client,
            limiter,
            retry,
            endpoint,
            store_id,
        }
    }

    /// URL of the review-count resource for a product
    pub fn reviews_url(&self, enrichment_key: &str) -> String {
        format!(
            "{}/store/{}/product/{}/reviews?page=1&perPage=1",
            self.endpoint.trim_end_matches('/'),
            self.store_id,
            enrichment_key
        )
    }

    /// Completes a record, calling the review API if it is waiting on one
    ///
    /// Records in any status other than `EnrichmentPending` pass through
    /// untouched. Only `review_count` and `status` are ever modified; the
    /// fields extracted by the detail stage are preserved as-is.
    pub async fn enrich(&self, mut record: ItemRecord) -> ItemRecord {
        if record.status != RecordStatus::EnrichmentPending {
            return record;
        }

        let key = match record.enrichment_key.as_deref() {
            Some(key) => key.to_string(),
            None => {
                // EnrichmentPending without a key cannot happen via the
                // detail stage; complete defensively rather than stall.
                tracing::warn!(
                    "record {} pending enrichment without a key",
                    record.source_url
                );
                record.review_count = Some(0);
                record.status = RecordStatus::Complete;
                return record;
            }
        };

        let url = self.reviews_url(&key);
        let count = match fetch_with_retry(&self.client, &self.limiter, &self.retry, &url).await {
            Ok(body) => match parse_review_count(&body) {
                Some(count) => count,
                None => {
                    tracing::warn!(
                        "review response for {} had no pagination.total, defaulting to 0",
                        record.source_url
                    );
                    0
                }
            },
            Err(e) => {
                tracing::warn!(
                    "review call for {} failed: {}; defaulting to 0",
                    record.source_url,
                    e
                );
                0
            }
        };

        record.review_count = Some(count);
        record.status = RecordStatus::Complete;
        record
    }
}
