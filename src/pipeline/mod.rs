//! Pipeline stages and orchestration
//!
//! - [`walker`]: sequential listing pagination driver (discovery)
//! - [`detail`]: per-item detail page extraction
//! - [`enrich`]: dependent review-count call
//! - [`coordinator`]: wires the stages together with a bounded worker pool
//!   and handles shutdown, checkpointing cadence, and the run summary

pub mod coordinator;
pub mod detail;
pub mod enrich;
pub mod walker;

pub use coordinator::{run_pipeline, Coordinator, RunSummary, Stage};
pub use detail::{build_record, DetailProcessor};
pub use enrich::{parse_review_count, Enricher};
pub use walker::{parse_listing, ListingPage, ListingWalker, WalkReport, WalkTerminal};
