//! Classical seasonal decomposition.
//!
//! Splits a fixed-frequency series into trend, seasonal, and remainder
//! components using a centered moving-average trend and per-phase seasonal
//! means, in additive or multiplicative form. The remainder is the exact
//! residual, so recombining the components reconstructs the input.

use crate::error::{AnalysisError, Result};
use std::str::FromStr;

/// Decomposition model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompositionModel {
    /// data = trend + seasonal + remainder
    #[default]
    Additive,
    /// data = trend * seasonal * remainder
    Multiplicative,
}

impl FromStr for DecompositionModel {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "additive" | "add" => Ok(Self::Additive),
            "multiplicative" | "mult" | "mul" => Ok(Self::Multiplicative),
            other => Err(AnalysisError::InvalidParameter {
                param: "model".into(),
                value: other.into(),
                reason: "expected 'additive' or 'multiplicative'".into(),
            }),
        }
    }
}

impl DecompositionModel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Additive => "additive",
            Self::Multiplicative => "multiplicative",
        }
    }
}

/// Result of a seasonal decomposition.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Trend component, one per input point
    pub trend: Vec<f64>,
    /// Seasonal component, one per input point
    pub seasonal: Vec<f64>,
    /// Remainder component, one per input point
    pub remainder: Vec<f64>,
    /// Seasonal period used
    pub period: usize,
    /// Model used ("additive" or "multiplicative")
    pub model: DecompositionModel,
}

/// Centered moving-average trend with edge extension.
fn moving_average_trend(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let window = if period % 2 == 0 { period + 1 } else { period };
    let half_window = window / 2;

    let mut trend = vec![f64::NAN; n];
    for i in half_window..(n - half_window) {
        let sum: f64 = values[i - half_window..=i + half_window].iter().sum();
        trend[i] = sum / window as f64;
    }

    // Extend trend to the edges
    let first_valid = trend.iter().position(|v| !v.is_nan()).unwrap_or(0);
    let last_valid = trend.iter().rposition(|v| !v.is_nan()).unwrap_or(n - 1);

    for i in 0..first_valid {
        trend[i] = trend[first_valid];
    }
    for i in (last_valid + 1)..n {
        trend[i] = trend[last_valid];
    }

    trend
}

/// Per-phase means of the detrended series.
fn seasonal_means(detrended: &[f64], period: usize) -> Vec<f64> {
    let n = detrended.len();
    let mut means = vec![0.0; period];

    for (phase, mean) in means.iter_mut().enumerate() {
        let mut sum = 0.0;
        let mut count = 0usize;
        let mut idx = phase;
        while idx < n {
            sum += detrended[idx];
            count += 1;
            idx += period;
        }
        *mean = if count > 0 { sum / count as f64 } else { 0.0 };
    }

    means
}

/// Decompose a fixed-frequency series into trend, seasonal, and remainder.
///
/// # Arguments
/// * `values` - Time series values
/// * `period` - Seasonal period (12 for monthly data)
/// * `model` - Additive or multiplicative composition
pub fn decompose(
    values: &[f64],
    period: usize,
    model: DecompositionModel,
) -> Result<Decomposition> {
    if period < 2 {
        return Err(AnalysisError::InvalidParameter {
            param: "period".into(),
            value: period.to_string(),
            reason: "must be at least 2".into(),
        });
    }

    let n = values.len();
    if n < 2 * period {
        return Err(AnalysisError::InsufficientData {
            needed: 2 * period,
            got: n,
        });
    }

    if model == DecompositionModel::Multiplicative && values.iter().any(|&v| v <= 0.0) {
        return Err(AnalysisError::InvalidInput(
            "Multiplicative decomposition requires strictly positive values".into(),
        ));
    }

    let trend = moving_average_trend(values, period);

    match model {
        DecompositionModel::Additive => {
            let detrended: Vec<f64> = values
                .iter()
                .zip(trend.iter())
                .map(|(v, t)| v - t)
                .collect();

            let mut means = seasonal_means(&detrended, period);
            // Center seasonal effects so they sum to zero over a cycle
            let grand_mean = means.iter().sum::<f64>() / period as f64;
            for m in &mut means {
                *m -= grand_mean;
            }

            let seasonal: Vec<f64> = (0..n).map(|i| means[i % period]).collect();
            let remainder: Vec<f64> = (0..n)
                .map(|i| values[i] - trend[i] - seasonal[i])
                .collect();

            Ok(Decomposition {
                trend,
                seasonal,
                remainder,
                period,
                model,
            })
        }
        DecompositionModel::Multiplicative => {
            let ratios: Vec<f64> = values
                .iter()
                .zip(trend.iter())
                .map(|(v, t)| v / t)
                .collect();

            let mut means = seasonal_means(&ratios, period);
            // Normalize seasonal indices to average one over a cycle
            let grand_mean = means.iter().sum::<f64>() / period as f64;
            if grand_mean.abs() > f64::EPSILON {
                for m in &mut means {
                    *m /= grand_mean;
                }
            }

            let seasonal: Vec<f64> = (0..n).map(|i| means[i % period]).collect();
            let remainder: Vec<f64> = (0..n)
                .map(|i| values[i] / (trend[i] * seasonal[i]))
                .collect();

            Ok(Decomposition {
                trend,
                seasonal,
                remainder,
                period,
                model,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn seasonal_series(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let trend = 50.0 + 0.4 * i as f64;
                let seasonal = 8.0 * (2.0 * PI * i as f64 / 12.0).sin();
                trend + seasonal
            })
            .collect()
    }

    #[test]
    fn test_additive_component_lengths() {
        let values = seasonal_series(60);
        let result = decompose(&values, 12, DecompositionModel::Additive).unwrap();

        assert_eq!(result.trend.len(), 60);
        assert_eq!(result.seasonal.len(), 60);
        assert_eq!(result.remainder.len(), 60);
        assert_eq!(result.period, 12);
    }

    #[test]
    fn test_additive_recombination() {
        let values = seasonal_series(72);
        let result = decompose(&values, 12, DecompositionModel::Additive).unwrap();

        for i in 0..values.len() {
            let rebuilt = result.trend[i] + result.seasonal[i] + result.remainder[i];
            assert_relative_eq!(rebuilt, values[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_multiplicative_recombination() {
        let values: Vec<f64> = (0..72)
            .map(|i| {
                let trend = 100.0 + 0.5 * i as f64;
                let seasonal = 1.0 + 0.25 * (2.0 * PI * i as f64 / 12.0).sin();
                trend * seasonal
            })
            .collect();
        let result = decompose(&values, 12, DecompositionModel::Multiplicative).unwrap();

        for i in 0..values.len() {
            let rebuilt = result.trend[i] * result.seasonal[i] * result.remainder[i];
            assert_relative_eq!(rebuilt, values[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_seasonal_component_is_periodic() {
        let values = seasonal_series(60);
        let result = decompose(&values, 12, DecompositionModel::Additive).unwrap();

        for i in 0..(60 - 12) {
            assert_relative_eq!(result.seasonal[i], result.seasonal[i + 12], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_additive_seasonal_sums_to_zero() {
        let values = seasonal_series(60);
        let result = decompose(&values, 12, DecompositionModel::Additive).unwrap();

        let cycle_sum: f64 = result.seasonal[..12].iter().sum();
        assert_relative_eq!(cycle_sum, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_multiplicative_rejects_nonpositive() {
        let mut values = seasonal_series(48);
        values[10] = -1.0;
        assert!(decompose(&values, 12, DecompositionModel::Multiplicative).is_err());
    }

    #[test]
    fn test_insufficient_data() {
        let values = seasonal_series(20);
        assert!(matches!(
            decompose(&values, 12, DecompositionModel::Additive),
            Err(AnalysisError::InsufficientData { needed: 24, got: 20 })
        ));
    }

    #[test]
    fn test_model_from_str() {
        assert_eq!(
            "multiplicative".parse::<DecompositionModel>().unwrap(),
            DecompositionModel::Multiplicative
        );
        assert_eq!(
            "mult".parse::<DecompositionModel>().unwrap(),
            DecompositionModel::Multiplicative
        );
        assert_eq!(
            "additive".parse::<DecompositionModel>().unwrap(),
            DecompositionModel::Additive
        );
        assert!("stl".parse::<DecompositionModel>().is_err());
    }
}
