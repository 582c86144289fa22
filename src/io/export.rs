//! Export batch results to CSV.
//!
//! Each input row is written back with its original cells followed by the
//! scoring result columns, so the file opens next to the source spreadsheet.
//! Rows that failed to parse keep their cells, empty result columns and the
//! error text.

use std::path::Path;

use crate::app::pipeline::BatchRow;
use crate::error::AppError;

pub const RESULT_COLUMNS: [&str; 8] = [
    "application_id",
    "predicted_score",
    "risk_level",
    "default_probability",
    "is_fraud",
    "fraud_score",
    "decision",
    "error",
];

/// Write batch results to a CSV file.
pub fn write_batch_csv(path: &Path, headers: &[String], rows: &[BatchRow]) -> Result<(), AppError> {
    super::ensure_parent_dir(path)?;
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| AppError::runtime(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_rows(&mut writer, headers, rows)?;
    writer
        .flush()
        .map_err(|e| AppError::runtime(format!("Failed to write export CSV: {e}")))?;
    Ok(())
}

fn write_rows<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    headers: &[String],
    rows: &[BatchRow],
) -> Result<(), AppError> {
    let row_err = |e: csv::Error| AppError::runtime(format!("Failed to write export CSV row: {e}"));

    let header: Vec<&str> = headers
        .iter()
        .map(String::as_str)
        .chain(RESULT_COLUMNS)
        .collect();
    writer.write_record(&header).map_err(row_err)?;

    for row in rows {
        // Short rows are padded so result columns stay aligned.
        let mut record: Vec<String> = (0..headers.len())
            .map(|i| row.fields.get(i).cloned().unwrap_or_default())
            .collect();
        record.extend(result_cells(row));
        writer.write_record(&record).map_err(row_err)?;
    }
    Ok(())
}

fn result_cells(row: &BatchRow) -> [String; 8] {
    match &row.outcome {
        Ok(a) => [
            row.application_id.clone().unwrap_or_default(),
            a.credit.credit_score.to_string(),
            a.credit.risk_level.to_string(),
            format!("{:.1}", a.credit.default_probability),
            a.fraud.is_fraud.to_string(),
            format!("{:.4}", a.fraud.fraud_score),
            a.decision.to_string(),
            String::new(),
        ],
        Err(message) => [
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            message.clone(),
        ],
    }
}
