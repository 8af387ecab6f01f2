//! Regular and irregular monthly series.
//!
//! A [`MonthlySeries`] is a gap-free fixed-frequency series defined by a
//! start (year, month) and a flat value vector. A [`DatedSeries`] pairs each
//! value with an explicit month key and may skip calendar months.

use crate::error::{AnalysisError, Result};
use crate::ingest::SalesRecord;
use chrono::{Datelike, NaiveDate};

/// Number of periods per seasonal cycle for monthly data.
pub const MONTHLY_FREQUENCY: usize = 12;

fn month_index(year: i32, month: u32) -> i64 {
    year as i64 * 12 + (month as i64 - 1)
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1)
        .expect("month validated in 1..=12")
}

/// A regular monthly time series.
///
/// Invariant: position k holds the observation exactly k months after the
/// start month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    start_year: i32,
    start_month: u32,
    values: Vec<f64>,
}

impl MonthlySeries {
    /// Create a monthly series from a flat value vector and a start month.
    pub fn new(start_year: i32, start_month: u32, values: Vec<f64>) -> Result<Self> {
        if !(1..=12).contains(&start_month) {
            return Err(AnalysisError::InvalidParameter {
                param: "start_month".into(),
                value: start_month.to_string(),
                reason: "must be in 1..=12".into(),
            });
        }
        if values.is_empty() {
            return Err(AnalysisError::InsufficientData { needed: 1, got: 0 });
        }
        Ok(Self {
            start_year,
            start_month,
            values,
        })
    }

    /// Build a monthly series from ingested records.
    ///
    /// Records must form a complete month grid; a calendar gap is an error
    /// here (use [`DatedSeries`] and the regularize module for sparse data).
    pub fn from_records(records: &[SalesRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(AnalysisError::InsufficientData { needed: 1, got: 0 });
        }

        let start = &records[0];
        let start_key = month_index(start.year, start.month);
        for (k, rec) in records.iter().enumerate() {
            let expected = start_key + k as i64;
            let actual = month_index(rec.year, rec.month);
            if actual != expected {
                return Err(AnalysisError::InvalidInput(format!(
                    "Missing month before {}-{:02}: records do not form a regular monthly grid",
                    rec.year, rec.month
                )));
            }
        }

        Self::new(
            start.year,
            start.month,
            records.iter().map(|r| r.sales).collect(),
        )
    }

    /// Seasonal frequency (periods per cycle). Always 12.
    pub fn frequency(&self) -> usize {
        MONTHLY_FREQUENCY
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn start(&self) -> (i32, u32) {
        (self.start_year, self.start_month)
    }

    /// Calendar (year, month) at offset k from the start.
    pub fn month_at(&self, k: usize) -> (i32, u32) {
        let idx = month_index(self.start_year, self.start_month) + k as i64;
        let year = idx.div_euclid(12) as i32;
        let month = idx.rem_euclid(12) as u32 + 1;
        (year, month)
    }

    /// First-of-month date at offset k.
    pub fn date_at(&self, k: usize) -> NaiveDate {
        let (year, month) = self.month_at(k);
        first_of_month(year, month)
    }

    /// First-of-month dates for every observation.
    pub fn months(&self) -> Vec<NaiveDate> {
        (0..self.len()).map(|k| self.date_at(k)).collect()
    }

    /// Pair each observation with its month key.
    pub fn to_dated(&self) -> DatedSeries {
        let pairs = self
            .values
            .iter()
            .enumerate()
            .map(|(k, &v)| (self.date_at(k), v))
            .collect();
        DatedSeries { pairs }
    }
}

/// An irregular series of (month, value) observations.
///
/// Invariant: dates strictly increasing. Calendar months may be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedSeries {
    pairs: Vec<(NaiveDate, f64)>,
}

impl DatedSeries {
    /// Create from (date, value) pairs; dates must be strictly increasing.
    pub fn from_pairs(pairs: Vec<(NaiveDate, f64)>) -> Result<Self> {
        if pairs.is_empty() {
            return Err(AnalysisError::InsufficientData { needed: 1, got: 0 });
        }
        for w in pairs.windows(2) {
            if w[1].0 <= w[0].0 {
                return Err(AnalysisError::InvalidInput(format!(
                    "Dates must be strictly increasing: {} does not follow {}",
                    w[1].0, w[0].0
                )));
            }
        }
        Ok(Self { pairs })
    }

    /// Build from ingested records, keying each row to the first of its month.
    /// Month gaps are tolerated.
    pub fn from_records(records: &[SalesRecord]) -> Result<Self> {
        let pairs = records
            .iter()
            .map(|r| (first_of_month(r.year, r.month), r.sales))
            .collect();
        Self::from_pairs(pairs)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NaiveDate, f64)> {
        self.pairs.iter()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.pairs.iter().map(|(d, _)| *d).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.pairs.iter().map(|(_, v)| *v).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.pairs[0].0
    }

    pub fn last_date(&self) -> NaiveDate {
        self.pairs[self.pairs.len() - 1].0
    }

    /// Remove the observations falling in the given months.
    ///
    /// Used by the walkthrough to manufacture an irregular series from a
    /// complete one. Months with no observation are ignored.
    pub fn without_months(&self, months: &[NaiveDate]) -> Result<Self> {
        let keys: Vec<(i32, u32)> = months.iter().map(|d| (d.year(), d.month())).collect();
        let pairs: Vec<(NaiveDate, f64)> = self
            .pairs
            .iter()
            .filter(|(d, _)| !keys.contains(&(d.year(), d.month())))
            .cloned()
            .collect();
        Self::from_pairs(pairs)
    }
}
