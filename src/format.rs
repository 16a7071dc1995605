use anyhow::{Context, Result};
use csv::{Terminator, WriterBuilder};
use std::time::Instant;
use tracing::{debug, info};

pub type Row = Vec<String>;

/// Rows that survived formatting, plus their CSV serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedReport {
    pub rows: Vec<Row>,
    pub csv: Vec<u8>,
}

/// Exact field-by-field equality: same length, same strings, same order.
/// No trimming and no case folding.
pub fn rows_match(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}

/// Drops every row after the first that repeats the report's original header.
///
/// The reports API paginates internally and re-emits its header at each page
/// boundary. Rows are always compared against the original first row, even
/// when `header_override` replaces it in the output.
pub fn dedup_rows(rows: &[Row], header_override: Option<&[String]>) -> Vec<Row> {
    let Some((original_header, body)) = rows.split_first() else {
        return Vec::new();
    };

    let mut output = Vec::with_capacity(rows.len());
    output.push(match header_override {
        Some(header) => header.to_vec(),
        None => original_header.clone(),
    });

    let mut skipped = 0usize;
    for (index, row) in body.iter().enumerate() {
        debug!(component = "csv_format", row_index = index + 1, row = ?row, "Read row");
        if rows_match(original_header, row) {
            skipped += 1;
            continue;
        }
        output.push(row.clone());
    }

    debug!(
        component = "csv_format",
        duplicate_headers = skipped,
        "Dropped repeated header rows"
    );
    output
}

/// Serializes rows as CSV with CRLF record terminators.
pub fn rows_to_csv(rows: &[Row]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row).context("Failed to write CSV row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV buffer: {}", e.error()))
}

pub fn format_report(rows: &[Row], header_override: Option<&[String]>) -> Result<FormattedReport> {
    let start_time = Instant::now();
    info!(action = "start", component = "csv_format", input_rows = rows.len(), "Formatting CSV report");

    let rows = dedup_rows(rows, header_override);
    let csv = rows_to_csv(&rows)?;

    info!(
        action = "complete",
        component = "csv_format",
        output_rows = rows.len(),
        bytes = csv.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Finished formatting CSV report"
    );
    Ok(FormattedReport { rows, csv })
}
