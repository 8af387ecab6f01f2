//! Descriptive statistics for a series.

use crate::error::{AnalysisError, Result};

/// Five-number summary plus mean and standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Percentile with linear interpolation between order statistics.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Summarizes a non-empty series. Standard deviation uses the sample
/// (n - 1) denominator and is 0 for a single observation.
pub fn summarize(values: &[f64]) -> Result<SeriesSummary> {
    if values.is_empty() {
        return Err(AnalysisError::InvalidInput("Empty series".into()));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::InvalidInput(
            "Series contains non-finite values".into(),
        ));
    }

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std_dev = if n > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    } else {
        0.0
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    Ok(SeriesSummary {
        count: n,
        mean,
        std_dev,
        min: sorted[0],
        q1: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.5),
        q3: percentile(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn summarizes_small_series() {
        let s = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.count, 8);
        assert_relative_eq!(s.mean, 5.0);
        assert_relative_eq!(s.std_dev, (32.0f64 / 7.0).sqrt());
        assert_relative_eq!(s.min, 2.0);
        assert_relative_eq!(s.median, 4.5);
        assert_relative_eq!(s.max, 9.0);
    }

    #[test]
    fn quartiles_interpolate() {
        let s = summarize(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_relative_eq!(s.q1, 1.75);
        assert_relative_eq!(s.q3, 3.25);
    }

    #[test]
    fn single_observation() {
        let s = summarize(&[3.0]).unwrap();
        assert_eq!(s.count, 1);
        assert_relative_eq!(s.std_dev, 0.0);
        assert_relative_eq!(s.q1, 3.0);
        assert_relative_eq!(s.max, 3.0);
    }

    #[test]
    fn rejects_empty_and_nan() {
        assert!(summarize(&[]).is_err());
        assert!(summarize(&[1.0, f64::NAN]).is_err());
    }
}
