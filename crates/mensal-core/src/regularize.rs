//! Month-grid alignment and missing value imputation.
//!
//! Resamples an irregular [`DatedSeries`] onto the complete monthly grid
//! between its first and last observation, then fills the gaps with a
//! selectable strategy.

use crate::error::{AnalysisError, Result};
use crate::series::{DatedSeries, MonthlySeries};
use chrono::{Datelike, Months, NaiveDate};
use std::str::FromStr;

/// All first-of-month dates from `first` to `last` inclusive.
pub fn month_span(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let start = first.with_day(1).unwrap_or(first);
    let mut months = Vec::new();
    let mut current = start;
    while current <= last {
        months.push(current);
        current = match current.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    months
}

/// Gap-filling strategy for [`regularize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMethod {
    /// Carry the last observation forward (LOCF).
    Locf,
    /// Carry the next observation backward (NOCB).
    Nocb,
    /// Fill with the mean of the observed months.
    Mean,
    /// Linear interpolation between neighbouring observations.
    Interpolate,
}

impl FillMethod {
    pub fn name(&self) -> &'static str {
        match self {
            FillMethod::Locf => "last observation carried forward",
            FillMethod::Nocb => "next observation carried backward",
            FillMethod::Mean => "observed mean",
            FillMethod::Interpolate => "linear interpolation",
        }
    }
}

impl FromStr for FillMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "locf" | "forward" => Ok(FillMethod::Locf),
            "nocb" | "backward" => Ok(FillMethod::Nocb),
            "mean" => Ok(FillMethod::Mean),
            "interpolate" | "linear" => Ok(FillMethod::Interpolate),
            other => Err(AnalysisError::InvalidParameter {
                param: "fill".into(),
                value: other.into(),
                reason: "expected 'locf', 'nocb', 'mean' or 'interpolate'".into(),
            }),
        }
    }
}

/// An irregular series aligned onto its complete monthly grid.
///
/// Invariant: the grid spans the first through the last observation, so the
/// first and last slots always hold a value; only interior months can be
/// `None`. The fill methods lean on that anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid {
    months: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl MonthGrid {
    pub fn months(&self) -> &[NaiveDate] {
        &self.months
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn start(&self) -> NaiveDate {
        self.months[0]
    }

    /// Carry the last observation forward into each gap. The first slot is
    /// always observed, so the carry is primed before the first gap.
    pub fn fill_forward(&self) -> Vec<f64> {
        let mut last = f64::NAN;
        self.values
            .iter()
            .map(|v| {
                if let Some(x) = *v {
                    last = x;
                }
                last
            })
            .collect()
    }

    /// Carry the next observation backward into each gap; mirror image of
    /// [`fill_forward`](Self::fill_forward), anchored at the last slot.
    pub fn fill_backward(&self) -> Vec<f64> {
        let mut out = vec![f64::NAN; self.values.len()];
        let mut next = f64::NAN;
        for (i, v) in self.values.iter().enumerate().rev() {
            if let Some(x) = *v {
                next = x;
            }
            out[i] = next;
        }
        out
    }

    /// Fill each gap with the mean of the observed months.
    pub fn fill_mean(&self) -> Vec<f64> {
        let (sum, count) = self
            .values
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        let mean = sum / count as f64;
        self.values.iter().map(|v| v.unwrap_or(mean)).collect()
    }

    /// Fill each gap by interpolating linearly between the nearest observed
    /// months on either side. Both ends are observed, so every gap has two
    /// neighbours.
    pub fn fill_interpolate(&self) -> Vec<f64> {
        let observed: Vec<(usize, f64)> = self
            .values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|x| (i, x)))
            .collect();

        let mut out = vec![f64::NAN; self.values.len()];
        for &(i, v) in &observed {
            out[i] = v;
        }
        for pair in observed.windows(2) {
            let (i0, v0) = pair[0];
            let (i1, v1) = pair[1];
            let gap = (i1 - i0) as f64;
            for j in (i0 + 1)..i1 {
                out[j] = v0 + (v1 - v0) * (j - i0) as f64 / gap;
            }
        }
        out
    }
}

/// Align an irregular series onto its full monthly grid.
///
/// Every observation is bucketed into its calendar month; when a month holds
/// several observations the latest one wins. Months the series skipped are
/// `None`.
pub fn align_to_month_grid(series: &DatedSeries) -> MonthGrid {
    let months = month_span(series.first_date(), series.last_date());
    let mut values = vec![None; months.len()];

    let mut observations = series.iter().peekable();
    for (i, slot) in months.iter().enumerate() {
        while let Some((date, value)) = observations.peek() {
            if date.year() == slot.year() && date.month() == slot.month() {
                values[i] = Some(*value);
                observations.next();
            } else {
                break;
            }
        }
    }

    MonthGrid { months, values }
}

/// Resample an irregular series onto the full monthly grid and fill the gaps
/// with the chosen strategy.
pub fn regularize(series: &DatedSeries, method: FillMethod) -> Result<MonthlySeries> {
    let grid = align_to_month_grid(series);
    let values = match method {
        FillMethod::Locf => grid.fill_forward(),
        FillMethod::Nocb => grid.fill_backward(),
        FillMethod::Mean => grid.fill_mean(),
        FillMethod::Interpolate => grid.fill_interpolate(),
    };

    let start = grid.start();
    MonthlySeries::new(start.year(), start.month(), values)
}

/// Shorthand for [`regularize`] with LOCF, the walkthrough's default repair.
pub fn regularize_locf(series: &DatedSeries) -> Result<MonthlySeries> {
    regularize(series, FillMethod::Locf)
}
