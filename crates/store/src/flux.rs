//! Flux query construction and annotated-CSV decoding.

use chrono::{DateTime, Utc};
use econ_pulse_core::{SeriesQuery, StoreError, StoredRecord};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Columns that are structural in annotated CSV rather than tags.
const STRUCTURAL_COLUMNS: &[&str] = &[
    "", "result", "table", "_start", "_stop", "_time", "_value", "_field", "_measurement",
];

fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Builds the Flux source for a [`SeriesQuery`].
#[must_use]
pub fn build_query(query: &SeriesQuery) -> String {
    let mut src = format!(
        "from(bucket: \"{}\")\n  |> range(start: -{}s)\n  |> filter(fn: (r) => r._measurement == \"{}\")",
        escape_string(&query.bucket),
        query.lookback.as_secs(),
        escape_string(&query.measurement),
    );

    let field = query.field.as_deref().unwrap_or("value");
    let _ = write!(src, "\n  |> filter(fn: (r) => r._field == \"{}\")", escape_string(field));

    for (key, value) in &query.tag_filters {
        let _ = write!(
            src,
            "\n  |> filter(fn: (r) => r.{} == \"{}\")",
            key,
            escape_string(value)
        );
    }

    src.push_str("\n  |> sort(columns: [\"_time\"])");
    src
}

/// Decodes an annotated-CSV query response into records.
///
/// Annotation rows (leading `#`) are skipped; the first remaining row
/// of each table is its header. Rows missing `_time` or `_value` are
/// dropped. Every non-structural column becomes a tag.
pub fn parse_annotated_csv(body: &str) -> Result<Vec<StoredRecord>, StoreError> {
    let mut records = Vec::new();
    let mut header: Option<Vec<String>> = None;

    for line in body.lines() {
        if line.is_empty() {
            // Blank line separates result tables; next row is a header.
            header = None;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());
        let row = match reader.records().next() {
            Some(row) => row.map_err(|e| StoreError::Decode(e.to_string()))?,
            None => continue,
        };
        let cells: Vec<String> = row.iter().map(str::to_string).collect();

        let Some(columns) = header.as_ref() else {
            header = Some(cells);
            continue;
        };

        let mut timestamp: Option<DateTime<Utc>> = None;
        let mut value: Option<f64> = None;
        let mut tags = BTreeMap::new();

        for (column, cell) in columns.iter().zip(cells.iter()) {
            match column.as_str() {
                "_time" => {
                    timestamp = DateTime::parse_from_rfc3339(cell)
                        .ok()
                        .map(|t| t.with_timezone(&Utc));
                }
                "_value" => value = cell.parse().ok(),
                c if STRUCTURAL_COLUMNS.contains(&c) => {}
                _ => {
                    if !cell.is_empty() {
                        tags.insert(column.clone(), cell.clone());
                    }
                }
            }
        }

        if let (Some(timestamp), Some(value)) = (timestamp, value) {
            records.push(StoredRecord {
                timestamp,
                tags,
                value,
            });
        }
    }

    Ok(records)
}
