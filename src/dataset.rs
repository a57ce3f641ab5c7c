use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::formats::DatasetRecord;

/// The dataset is written as `utf-8-sig`: a BOM ahead of the header row, so
/// spreadsheet tools decode emoji in titles correctly.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read the set of video IDs already present in the dataset.
///
/// A missing file is simply an empty history. A file that exists but cannot
/// be read or parsed is an error; the caller decides whether to absorb it
/// (the pipeline logs a warning and starts from an empty set).
pub fn load_existing_ids(path: &Path) -> anyhow::Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let bytes =
        std::fs::read(path).with_context(|| format!("read dataset: {}", path.display()))?;
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader
        .headers()
        .with_context(|| format!("read dataset header: {}", path.display()))?;
    let id_column = headers
        .iter()
        .position(|name| name == "video_id")
        .ok_or_else(|| anyhow::anyhow!("dataset has no video_id column: {}", path.display()))?;

    let mut ids = HashSet::new();
    for row in reader.records() {
        let row = row.with_context(|| format!("read dataset row: {}", path.display()))?;
        if let Some(id) = row.get(id_column) {
            ids.insert(id.to_owned());
        }
    }

    Ok(ids)
}

/// Append a batch of records, creating the file (BOM + header) on first use.
/// Called once per accepted page so partial progress survives a crash.
pub fn append_records(path: &Path, records: &[DatasetRecord]) -> anyhow::Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    let is_new = !path.exists();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open dataset for append: {}", path.display()))?;
    if is_new {
        file.write_all(UTF8_BOM)
            .with_context(|| format!("write dataset BOM: {}", path.display()))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(is_new)
        .from_writer(file);
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("serialize dataset row: {}", record.video_id))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush dataset: {}", path.display()))?;

    Ok(())
}
