//! Crawl state and record types
//!
//! - [`RecordStatus`] / [`ItemRecord`]: the unit of work flowing through the
//!   detail and enrichment stages. Records are single-owner and move by
//!   value between stages.
//! - [`CrawlState`]: discovery-side progress (visited listing pages, the
//!   dedup set of discovered item URLs, the pending frontier), persisted as
//!   a checkpoint after every listing page.

mod crawl_state;
mod record;

pub use crawl_state::CrawlState;
pub use record::{ItemRecord, RecordStatus};

pub(crate) use record::FIELD_DEFAULT;
