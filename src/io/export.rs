//! Export the rate table to CSV.
//!
//! One row per published month, easy to consume in spreadsheets:
//! `year,month,month_name,raw,rate_percent`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{MONTH_NAMES, RateTable, parse_rate_percent};
use crate::error::AppError;

/// Write the table to a CSV file.
pub fn write_rate_table_csv(path: &Path, table: &RateTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_rate_table(file, table)
}

/// Write the table as CSV to any writer.
///
/// Unpublished months are written with an empty `rate_percent`.
pub fn write_rate_table<W: Write>(mut out: W, table: &RateTable) -> Result<(), AppError> {
    writeln!(out, "year,month,month_name,raw,rate_percent")
        .map_err(|e| AppError::Io(format!("Failed to write export CSV header: {e}")))?;

    for year in table.years().iter() {
        for (idx, raw) in table.months(year).iter().enumerate() {
            let rate = parse_rate_percent(raw).map(|r| r.to_string()).unwrap_or_default();
            writeln!(
                out,
                "{},{},{},\"{}\",{}",
                year,
                idx + 1,
                MONTH_NAMES[idx],
                raw.replace('"', "\"\""),
                rate
            )
            .map_err(|e| AppError::Io(format!("Failed to write export CSV row: {e}")))?;
        }
    }

    out.flush()
        .map_err(|e| AppError::Io(format!("Failed to flush export CSV: {e}")))
}
