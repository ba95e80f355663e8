use super::traits::SinkResult;
use crate::state::ItemRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes records as one JSON object per line
pub fn write_jsonl(records: &[ItemRecord], path: &Path) -> SinkResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes records as a single JSON array
pub fn write_json(records: &[ItemRecord], path: &Path) -> SinkResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Writes records as a flat CSV, one row per record
///
/// Multi-valued fields are joined with `;`; absent price and review count
/// become empty cells.
pub fn write_csv(records: &[ItemRecord], path: &Path) -> SinkResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record([
        "source_url",
        "primary_image_url",
        "brand",
        "name",
        "price",
        "colour",
        "sizes",
        "description",
        "size_and_fit",
        "fabric_care",
        "image_urls",
        "enrichment_key",
        "review_count",
        "status",
    ])?;

    for record in records {
        writer.write_record([
            record.source_url.as_str(),
            record.primary_image_url.as_str(),
            record.brand.as_str(),
            record.name.as_str(),
            &record.price.map(|p| p.to_string()).unwrap_or_default(),
            record.colour.as_str(),
            &record.sizes.join(";"),
            record.description.as_str(),
            record.size_and_fit.as_str(),
            record.fabric_care.as_str(),
            &record.image_urls.join(";"),
            record.enrichment_key.as_deref().unwrap_or(""),
            &record.review_count.map(|c| c.to_string()).unwrap_or_default(),
            record.status.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RecordStatus;
    use tempfile::TempDir;

    fn sample_record(url: &str) -> ItemRecord {
        let mut record = ItemRecord::new(url);
        record.brand = "CARBON38".to_string();
        record.name = "Ribbed Tee".to_string();
        record.price = Some(128.0);
        record.sizes = vec!["XS".to_string(), "S".to_string()];
        record.review_count = Some(17);
        record.status = RecordStatus::Complete;
        record
    }

    #[test]
    fn jsonl_is_one_object_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jl");
        let records = vec![
            sample_record("https://example.com/a"),
            sample_record("https://example.com/b"),
        ];

        write_jsonl(&records, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: ItemRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.source_url, "https://example.com/a");
    }

    #[test]
    fn json_is_a_single_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        let records = vec![sample_record("https://example.com/a")];

        write_json(&records, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<ItemRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].review_count, Some(17));
    }

    #[test]
    fn csv_has_header_and_joined_multivalue_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.csv");
        let records = vec![sample_record("https://example.com/a")];

        write_csv(&records, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("source_url,"));
        let row = lines.next().unwrap();
        assert!(row.contains("XS;S"));
        assert!(row.contains("complete"));
    }

    #[test]
    fn csv_absent_numerics_are_empty_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.csv");
        let mut record = ItemRecord::new("https://example.com/a");
        record.status = RecordStatus::Failed;
        write_csv(&[record], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let row = content.lines().nth(1).unwrap();
        assert!(row.ends_with(",failed"));
        assert!(row.contains(",,"));
    }
}
