//! Durable record output
//!
//! Completed (or explicitly failed) records accumulate in a sink keyed by
//! `source_url` and are persisted in one or more encodings — jsonl, a
//! single JSON array, csv — from one pass over the buffer. Re-accepting a
//! URL overwrites, which is what makes resumed runs safe.

mod multi;
mod traits;
mod writers;

pub use multi::MultiFormatSink;
pub use traits::{RecordSink, SinkError, SinkResult};
pub use writers::{write_csv, write_json, write_jsonl};
