use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing status of an item record
///
/// The detail stage decides whether a record needs the dependent
/// review-count call; that decision is carried here as data rather than as
/// control flow, and the enrichment stage only ever consumes records in
/// `EnrichmentPending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Created, detail extraction not yet done
    Pending,

    /// Detail fields extracted; waiting on the review-count call
    EnrichmentPending,

    /// Fully processed; safe to persist
    Complete,

    /// Per-item processing failed; persisted with whatever was extracted
    Failed,
}

impl RecordStatus {
    /// Returns true if no further processing is needed
    ///
    /// Only terminal records may reach the sink.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::EnrichmentPending => "enrichment_pending",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One catalog item as it moves through the pipeline
///
/// Every string field defaults to `"not found"` when the selector comes up
/// empty; multi-valued fields default to an empty sequence; `price` is
/// `None` when absent or unparseable. A record is mutated only by the stage
/// that currently owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Detail page URL; unique key in the sink
    pub source_url: String,
    pub primary_image_url: String,
    pub brand: String,
    pub name: String,
    /// Currency-stripped numeric price
    pub price: Option<f64>,
    pub colour: String,
    pub sizes: Vec<String>,
    pub description: String,
    pub size_and_fit: String,
    pub fabric_care: String,
    pub image_urls: Vec<String>,
    /// Product ID for the review-count call, when the page carries one
    pub enrichment_key: Option<String>,
    pub review_count: Option<u64>,
    pub status: RecordStatus,
}

/// Default for required string fields whose selector matched nothing
pub(crate) const FIELD_DEFAULT: &str = "not found";

impl ItemRecord {
    /// Creates an empty record for a discovered item URL
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            primary_image_url: FIELD_DEFAULT.to_string(),
            brand: FIELD_DEFAULT.to_string(),
            name: FIELD_DEFAULT.to_string(),
            price: None,
            colour: FIELD_DEFAULT.to_string(),
            sizes: Vec::new(),
            description: String::new(),
            size_and_fit: String::new(),
            fabric_care: String::new(),
            image_urls: Vec::new(),
            enrichment_key: None,
            review_count: None,
            status: RecordStatus::Pending,
        }
    }

    /// Marks a record failed, keeping whatever fields were extracted
    ///
    /// A failed item still appears in the output rather than vanishing.
    pub fn mark_failed(&mut self) {
        self.status = RecordStatus::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(RecordStatus::Complete.is_terminal());
        assert!(RecordStatus::Failed.is_terminal());
        assert!(!RecordStatus::Pending.is_terminal());
        assert!(!RecordStatus::EnrichmentPending.is_terminal());
    }

    #[test]
    fn new_record_carries_documented_defaults() {
        let record = ItemRecord::new("https://example.com/products/tee");
        assert_eq!(record.brand, "not found");
        assert_eq!(record.price, None);
        assert!(record.sizes.is_empty());
        assert_eq!(record.description, "");
        assert_eq!(record.status, RecordStatus::Pending);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&RecordStatus::EnrichmentPending).unwrap();
        assert_eq!(json, "\"enrichment_pending\"");
    }

    #[test]
    fn record_round_trips_through_json() {
        let mut record = ItemRecord::new("https://example.com/p");
        record.price = Some(128.0);
        record.sizes = vec!["XS".to_string(), "S".to_string()];
        record.status = RecordStatus::Complete;

        let json = serde_json::to_string(&record).unwrap();
        let back: ItemRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
