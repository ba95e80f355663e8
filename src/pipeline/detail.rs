//! Detail processor: structured extraction from item pages
//!
//! Field extraction is total: every selector miss resolves to its
//! documented default and is logged, never raised. The one decision this
//! stage makes — does the item need the dependent review-count call — is
//! written onto the record as [`RecordStatus::EnrichmentPending`] or
//! [`RecordStatus::Complete`], so the follow-up dependency lives in the
//! data model instead of control flow.

use crate::extract::{self, selectors, Document, Extracted};
use crate::fetch::{fetch_with_retry, RateLimiter, RetryPolicy};
use crate::robots::RobotsRules;
use crate::state::{ItemRecord, RecordStatus, FIELD_DEFAULT};
use reqwest::Client;
use url::Url;

/// Builds a record from a fetched detail page body
///
/// Pure function of the body and URL: re-running it on the same document
/// yields an identical record.
pub fn build_record(body: &str, source_url: &Url) -> ItemRecord {
    let doc = Document::parse(body, source_url.clone());
    let mut record = ItemRecord::new(source_url.as_str());

    record.brand = required_field(&doc, &selectors::BRAND);
    record.name = required_field(&doc, &selectors::NAME);
    record.colour = required_field(&doc, &selectors::COLOUR);

    record.price = match extract::extract(&doc, &selectors::PRICE) {
        Extracted::Value(text) => {
            let parsed = parse_price(&text);
            if parsed.is_none() {
                tracing::warn!("unparseable price '{}' on {}", text, source_url);
            }
            parsed
        }
        Extracted::Absent => {
            tracing::warn!("field 'price' absent on {}", source_url);
            None
        }
    };

    record.sizes = extract::extract_all(&doc, &selectors::SIZES);

    record.image_urls = extract::extract_all(&doc, &selectors::IMAGES)
        .iter()
        .map(|u| extract::ensure_https(u))
        .collect();

    record.primary_image_url = match extract::extract(&doc, &selectors::PRIMARY_IMAGE) {
        Extracted::Value(u) => extract::ensure_https(&u),
        Extracted::Absent => {
            tracing::warn!("field 'primary_image_url' absent on {}", source_url);
            FIELD_DEFAULT.to_string()
        }
    };

    for (question, answer) in selectors::faq_entries(&doc) {
        match question.as_str() {
            selectors::FAQ_DESCRIPTION => record.description = answer,
            selectors::FAQ_SIZE_AND_FIT => record.size_and_fit = answer,
            selectors::FAQ_FABRIC_CARE => record.fabric_care = answer,
            _ => {}
        }
    }

    // The central fork: with a product ID the record waits on the
    // review-count call; without one it completes here with zero reviews.
    match extract::extract(&doc, &selectors::ENRICHMENT_KEY) {
        Extracted::Value(key) => {
            record.enrichment_key = Some(key);
            record.status = RecordStatus::EnrichmentPending;
        }
        Extracted::Absent => {
            tracing::warn!("no enrichment key on {}, recording zero reviews", source_url);
            record.review_count = Some(0);
            record.status = RecordStatus::Complete;
        }
    }

    record
}

fn required_field(doc: &Document, field: &extract::FieldSelector) -> String {
    match extract::extract(doc, field) {
        Extracted::Value(v) => v,
        Extracted::Absent => {
            tracing::warn!(
                "field '{}' absent on {}",
                field.name,
                doc.base_url().as_str()
            );
            FIELD_DEFAULT.to_string()
        }
    }
}

/// Parses a displayed price into a number
///
/// Strips currency codes/symbols and thousands separators, trims, then
/// parses. `"128.00 USD"` → `Some(128.0)`; garbage → `None`.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Fetches detail pages and turns them into records
pub struct DetailProcessor {
    client: Client,
    limiter: RateLimiter,
    retry: RetryPolicy,
    robots: RobotsRules,
    user_agent: String,
}

impl DetailProcessor {
    pub fn new(
        client: Client,
        limiter: RateLimiter,
        retry: RetryPolicy,
        robots: RobotsRules,
        user_agent: String,
    ) -> Self {
        Self {
            client,
            limiter,
            retry,
            robots,
            user_agent,
        }
    }

    /// Processes one item URL into a record
    ///
    /// Never fails the pipeline: a fetch failure (after retries) or a
    /// robots denial produces a `Failed` record carrying the source URL
    /// and field defaults, so the item is visible in the output instead of
    /// silently lost.
    pub async fn process(&self, item_url: &str) -> ItemRecord {
        if !self.robots.is_allowed(item_url, &self.user_agent) {
            tracing::warn!("detail page {} disallowed by robots.txt", item_url);
            let mut record = ItemRecord::new(item_url);
            record.mark_failed();
            return record;
        }

        let body =
            match fetch_with_retry(&self.client, &self.limiter, &self.retry, item_url).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("detail fetch for {} failed: {}; marking failed", item_url, e);
                    let mut record = ItemRecord::new(item_url);
                    record.mark_failed();
                    return record;
                }
            };

        match Url::parse(item_url) {
            Ok(url) => build_record(&body, &url),
            Err(e) => {
                tracing::warn!("invalid item url {}: {}", item_url, e);
                let mut record = ItemRecord::new(item_url);
                record.mark_failed();
                record
            }
        }
    }
}
