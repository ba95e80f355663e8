use crate::state::ItemRecord;
use thiserror::Error;

/// Errors that can occur while accumulating or persisting records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("refusing non-terminal record for {url} (status {status})")]
    NonTerminal { url: String, status: String },
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for completed records
///
/// Implementations must be safe to call from multiple worker tasks at once
/// and must not assume records arrive in discovery order. `accept` is
/// idempotent per `source_url`: feeding the same URL again overwrites the
/// previous record.
pub trait RecordSink: Send + Sync {
    /// Accepts a terminal record into the buffer
    ///
    /// Rejects records whose status is not Complete or Failed; a partial
    /// record must never be persisted as if it were done.
    fn accept(&self, record: ItemRecord) -> SinkResult<()>;

    /// Persists everything accepted so far
    fn flush(&self) -> SinkResult<()>;
}
