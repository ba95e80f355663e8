use super::traits::{RecordSink, SinkError, SinkResult};
use super::writers::{write_csv, write_json, write_jsonl};
use crate::config::OutputFormat;
use crate::state::{ItemRecord, RecordStatus};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Sink producing every configured encoding from one record buffer
///
/// The buffer is the only structure in the pipeline written by multiple
/// tasks concurrently, so all access goes through one mutex. Records are
/// keyed by `source_url` with first-accepted ordering preserved; a repeat
/// accept overwrites in place.
pub struct MultiFormatSink {
    directory: PathBuf,
    formats: Vec<OutputFormat>,
    buffer: Mutex<Buffer>,
}

#[derive(Default)]
struct Buffer {
    order: Vec<String>,
    records: HashMap<String, ItemRecord>,
}

impl MultiFormatSink {
    pub fn new(directory: impl Into<PathBuf>, formats: Vec<OutputFormat>) -> Self {
        Self {
            directory: directory.into(),
            formats,
            buffer: Mutex::new(Buffer::default()),
        }
    }

    /// Number of records currently buffered
    pub fn record_count(&self) -> usize {
        self.buffer.lock().unwrap().records.len()
    }

    /// (complete, failed) counts for the run summary
    pub fn status_counts(&self) -> (usize, usize) {
        let buffer = self.buffer.lock().unwrap();
        let complete = buffer
            .records
            .values()
            .filter(|r| r.status == RecordStatus::Complete)
            .count();
        let failed = buffer.records.len() - complete;
        (complete, failed)
    }

    fn snapshot(&self) -> Vec<ItemRecord> {
        let buffer = self.buffer.lock().unwrap();
        buffer
            .order
            .iter()
            .filter_map(|url| buffer.records.get(url).cloned())
            .collect()
    }
}

impl RecordSink for MultiFormatSink {
    fn accept(&self, record: ItemRecord) -> SinkResult<()> {
        if !record.status.is_terminal() {
            return Err(SinkError::NonTerminal {
                url: record.source_url.clone(),
                status: record.status.to_string(),
            });
        }

        let mut buffer = self.buffer.lock().unwrap();
        let url = record.source_url.clone();
        if buffer.records.insert(url.clone(), record).is_none() {
            buffer.order.push(url);
        }
        Ok(())
    }

    fn flush(&self) -> SinkResult<()> {
        std::fs::create_dir_all(&self.directory)?;
        let records = self.snapshot();

        for format in &self.formats {
            let path = self.directory.join(format.file_name());
            match format {
                OutputFormat::Jsonl => write_jsonl(&records, &path)?,
                OutputFormat::Json => write_json(&records, &path)?,
                OutputFormat::Csv => write_csv(&records, &path)?,
            }
            tracing::info!("wrote {} records to {}", records.len(), path.display());
        }

        Ok(())
    }
}
