use crate::models::EvaluationRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::io::Write;
use std::path::Path;

/// Column headers of the exported table
const CSV_HEADERS: [&str; 6] = [
    "Model",
    "Scenario",
    "Trust Score (%)",
    "Issues Found",
    "Issues Fixed",
    "Timestamp",
];

/// Default export file name for a given date, e.g. `evaluations_2025-11-04.csv`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("evaluations_{}.csv", date.format("%Y-%m-%d"))
}

/// Timestamp format used in the exported table
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Write the given records as CSV.
///
/// Trust scores are rendered as percentages with one decimal; fields
/// containing commas or quotes are double-quoted.
pub fn write_csv<W: Write>(records: &[EvaluationRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(CSV_HEADERS)
        .context("Failed to write CSV header")?;

    for record in records {
        csv_writer
            .write_record(&[
                record.model.name.clone(),
                record.scenario.title.clone(),
                format!("{:.1}", record.metrics.trust_score * 100.0),
                record.metrics.hallucinations_found.to_string(),
                record.metrics.hallucinations_corrected.to_string(),
                format_timestamp(&record.timestamp),
            ])
            .with_context(|| format!("Failed to write CSV row for evaluation {}", record.id))?;
    }

    csv_writer.flush().context("Failed to flush CSV output")
}

/// Export the records to a file, creating parent directories as needed
pub fn export_to_file(records: &[EvaluationRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;

    write_csv(records, file)
}
