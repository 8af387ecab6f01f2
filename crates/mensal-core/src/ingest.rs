//! CSV ingestion for monthly sales tables.
//!
//! The expected input is a headered CSV with Year, Month, and Sales columns
//! where Sales may carry ASCII thousands separators ("1,234").

use crate::error::{AnalysisError, Result};
use std::io::Read;
use std::path::Path;

/// One row of the sales table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalesRecord {
    pub year: i32,
    pub month: u32,
    pub sales: f64,
}

/// Parse a numeric field that may use thousands separators.
///
/// "1,234" parses to 1234.0 and "12,345.6" to 12345.6. Whitespace around the
/// field is ignored. Empty or otherwise unparseable text is an error so bad
/// rows are reported rather than silently coerced.
pub fn parse_grouped_number(text: &str) -> std::result::Result<f64, std::num::ParseFloatError> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>()
}

fn field<'a>(record: &'a csv::StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("")
}

/// Read sales records from any reader producing the Year/Month/Sales CSV.
///
/// Rows must be month-ordered: each (year, month) strictly after the
/// previous. Calendar gaps between rows are allowed; the series layer
/// decides whether they are acceptable.
pub fn read_sales_records<R: Read>(reader: R) -> Result<Vec<SalesRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut prev_key: Option<i64> = None;

    for (i, row) in csv_reader.records().enumerate() {
        let row = row?;
        // Header is row 1 in the file, so data rows start at 2.
        let row_number = i + 2;

        let year: i32 = field(&row, 0)
            .parse()
            .map_err(|_| AnalysisError::Parse {
                row: row_number,
                field: "Year".into(),
                text: field(&row, 0).to_string(),
            })?;

        let month: u32 = field(&row, 1)
            .parse()
            .map_err(|_| AnalysisError::Parse {
                row: row_number,
                field: "Month".into(),
                text: field(&row, 1).to_string(),
            })?;

        if !(1..=12).contains(&month) {
            return Err(AnalysisError::InvalidInput(format!(
                "Row {}: month {} out of range 1..=12",
                row_number, month
            )));
        }

        let sales = parse_grouped_number(field(&row, 2)).map_err(|_| AnalysisError::Parse {
            row: row_number,
            field: "Sales".into(),
            text: field(&row, 2).to_string(),
        })?;

        let key = year as i64 * 12 + (month as i64 - 1);
        if let Some(prev) = prev_key {
            if key <= prev {
                return Err(AnalysisError::InvalidInput(format!(
                    "Row {}: {}-{:02} is not after the previous row",
                    row_number, year, month
                )));
            }
        }
        prev_key = Some(key);

        records.push(SalesRecord { year, month, sales });
    }

    if records.is_empty() {
        return Err(AnalysisError::InsufficientData { needed: 1, got: 0 });
    }

    Ok(records)
}

/// Read sales records from a CSV file on disk.
pub fn read_sales_csv<P: AsRef<Path>>(path: P) -> Result<Vec<SalesRecord>> {
    let file = std::fs::File::open(path)?;
    read_sales_records(file)
}
