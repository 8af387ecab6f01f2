//! Autocorrelation and stationarity hypothesis tests.
//!
//! Box-Pierce and Ljung-Box portmanteau tests, the augmented Dickey-Fuller
//! unit-root test (constant, no trend), and the KPSS level-stationarity
//! test. ADF and KPSS p-values are interpolated from the standard asymptotic
//! critical-value tables and clamped to the tabulated range, the same
//! convention the usual statistics packages print.

use crate::error::{AnalysisError, Result};
use crate::ols::ols;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Outcome of a hypothesis test.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    /// Test statistic
    pub statistic: f64,
    /// P-value (clamped for the table-based tests)
    pub p_value: f64,
    /// Number of lags used
    pub lags: usize,
}

impl TestOutcome {
    /// Whether the null hypothesis is rejected at the given level.
    pub fn rejects_null(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Sample autocorrelation function up to `max_lag`, lag 0 included.
pub fn acf(values: &[f64], max_lag: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return vec![];
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let denominator: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();

    (0..=max_lag.min(n - 1))
        .map(|k| {
            if denominator.abs() < f64::EPSILON {
                if k == 0 {
                    1.0
                } else {
                    0.0
                }
            } else {
                let numerator: f64 = (k..n)
                    .map(|t| (values[t] - mean) * (values[t - k] - mean))
                    .sum();
                numerator / denominator
            }
        })
        .collect()
}

fn portmanteau(values: &[f64], lags: usize, fitdf: usize, ljung: bool) -> Result<TestOutcome> {
    let n = values.len();
    if n <= lags + 1 {
        return Err(AnalysisError::InsufficientData {
            needed: lags + 2,
            got: n,
        });
    }
    if lags == 0 || lags <= fitdf {
        return Err(AnalysisError::InvalidParameter {
            param: "lags".into(),
            value: lags.to_string(),
            reason: "must exceed the number of fitted parameters".into(),
        });
    }

    let autocorr = acf(values, lags);
    let nf = n as f64;

    let statistic = if ljung {
        nf * (nf + 2.0)
            * (1..=lags)
                .map(|k| autocorr[k].powi(2) / (nf - k as f64))
                .sum::<f64>()
    } else {
        nf * (1..=lags).map(|k| autocorr[k].powi(2)).sum::<f64>()
    };

    let df = (lags - fitdf) as f64;
    let chi2 = ChiSquared::new(df)
        .map_err(|e| AnalysisError::ComputationError(format!("chi-squared({df}): {e}")))?;
    let p_value = 1.0 - chi2.cdf(statistic);

    Ok(TestOutcome {
        statistic,
        p_value,
        lags,
    })
}

/// Box-Pierce test for autocorrelation up to `lags`.
///
/// `fitdf` is subtracted from the degrees of freedom when testing residuals
/// of a fitted model; pass 0 for a raw series.
pub fn box_pierce(values: &[f64], lags: usize, fitdf: usize) -> Result<TestOutcome> {
    portmanteau(values, lags, fitdf, false)
}

/// Ljung-Box test for autocorrelation up to `lags`.
pub fn ljung_box(values: &[f64], lags: usize, fitdf: usize) -> Result<TestOutcome> {
    portmanteau(values, lags, fitdf, true)
}

/// Interpolate a p-value from (statistic, p) anchor points ordered by
/// statistic. Clamps outside the table.
fn interpolate_p(table: &[(f64, f64)], statistic: f64) -> f64 {
    if statistic <= table[0].0 {
        return table[0].1;
    }
    let last = table[table.len() - 1];
    if statistic >= last.0 {
        return last.1;
    }
    for w in table.windows(2) {
        let (s0, p0) = w[0];
        let (s1, p1) = w[1];
        if statistic <= s1 {
            let frac = (statistic - s0) / (s1 - s0);
            return p0 + frac * (p1 - p0);
        }
    }
    last.1
}

/// Default lag order by Schwert's rule.
fn schwert_lags(n: usize) -> usize {
    (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize
}

/// Augmented Dickey-Fuller unit-root test with a constant term.
///
/// Null hypothesis: the series has a unit root (non-stationary). Small
/// p-values reject the unit root. The lag order defaults to Schwert's rule
/// when `lags` is `None`.
pub fn adf_test(values: &[f64], lags: Option<usize>) -> Result<TestOutcome> {
    let n = values.len();
    let lag_order = lags.unwrap_or_else(|| schwert_lags(n));

    // Need rows for the lagged differences plus a sane estimation margin
    if n < lag_order + 10 {
        return Err(AnalysisError::InsufficientData {
            needed: lag_order + 10,
            got: n,
        });
    }

    let diff: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    // Regression rows: t runs over diff indices lag_order..diff.len()
    let start = lag_order;
    let rows = diff.len() - start;

    let y: Vec<f64> = diff[start..].to_vec();
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(lag_order + 1);

    // Level term y_{t-1}
    columns.push((0..rows).map(|i| values[start + i]).collect());
    // Lagged differences
    for lag in 1..=lag_order {
        columns.push((0..rows).map(|i| diff[start + i - lag]).collect());
    }

    let fit = ols(&y, &columns, true)?;

    // t statistic on the level coefficient (index 1, after the intercept)
    let statistic = fit.coefficients[1] / fit.std_errors[1];

    // Asymptotic Dickey-Fuller distribution with constant (tau-mu) quantiles
    const TABLE: [(f64, f64); 9] = [
        (-3.43, 0.01),
        (-3.12, 0.025),
        (-2.86, 0.05),
        (-2.57, 0.10),
        (-1.57, 0.50),
        (-0.44, 0.90),
        (-0.07, 0.95),
        (0.23, 0.975),
        (0.60, 0.99),
    ];
    let p_value = interpolate_p(&TABLE, statistic).clamp(0.01, 0.99);

    Ok(TestOutcome {
        statistic,
        p_value,
        lags: lag_order,
    })
}

/// KPSS test for level stationarity.
///
/// Null hypothesis: the series is stationary around a level. Small p-values
/// reject stationarity. The bandwidth defaults to the short legacy rule when
/// `lags` is `None`.
pub fn kpss_test(values: &[f64], lags: Option<usize>) -> Result<TestOutcome> {
    let n = values.len();
    if n < 10 {
        return Err(AnalysisError::InsufficientData { needed: 10, got: n });
    }

    let bandwidth = lags.unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize);

    let mean = values.iter().sum::<f64>() / n as f64;
    let errors: Vec<f64> = values.iter().map(|v| v - mean).collect();

    // Partial sums of the demeaned series
    let mut partial = 0.0;
    let mut sum_s2 = 0.0;
    for e in &errors {
        partial += e;
        sum_s2 += partial * partial;
    }

    // Long-run variance with Bartlett weights
    let gamma0: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n as f64;
    let mut long_run = gamma0;
    for j in 1..=bandwidth.min(n - 1) {
        let gamma_j: f64 = (j..n).map(|t| errors[t] * errors[t - j]).sum::<f64>() / n as f64;
        let weight = 1.0 - j as f64 / (bandwidth as f64 + 1.0);
        long_run += 2.0 * weight * gamma_j;
    }

    if long_run <= f64::EPSILON {
        return Err(AnalysisError::ComputationError(
            "Degenerate long-run variance in KPSS test".into(),
        ));
    }

    let statistic = sum_s2 / (n as f64 * n as f64 * long_run);

    // Level-stationarity critical values (10%, 5%, 2.5%, 1%)
    const TABLE: [(f64, f64); 4] = [
        (0.347, 0.10),
        (0.463, 0.05),
        (0.574, 0.025),
        (0.739, 0.01),
    ];
    let p_value = interpolate_p(&TABLE, statistic).clamp(0.01, 0.10);

    Ok(TestOutcome {
        statistic,
        p_value,
        lags: bandwidth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Deterministic uniform(-1, 1) noise from a linear congruential step.
    fn white_noise(n: usize, mut seed: u64) -> Vec<f64> {
        (0..n)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((seed >> 33) as f64 / (1u64 << 31) as f64) - 1.0
            })
            .collect()
    }

    fn random_walk(n: usize, seed: u64) -> Vec<f64> {
        let noise = white_noise(n, seed);
        let mut sum = 0.0;
        noise
            .iter()
            .map(|e| {
                sum += e;
                sum
            })
            .collect()
    }

    #[test]
    fn test_acf_lag_zero_is_one() {
        let values = white_noise(100, 7);
        let r = acf(&values, 10);
        assert_relative_eq!(r[0], 1.0, epsilon = 1e-12);
        assert_eq!(r.len(), 11);
    }

    #[test]
    fn test_acf_of_constant_series() {
        let values = vec![4.0; 20];
        let r = acf(&values, 3);
        assert_relative_eq!(r[0], 1.0);
        assert_relative_eq!(r[1], 0.0);
    }

    #[test]
    fn test_ljung_box_white_noise_not_rejected() {
        let values = white_noise(300, 42);
        let outcome = ljung_box(&values, 12, 0).unwrap();
        assert!(
            outcome.p_value > 0.05,
            "white noise flagged as autocorrelated: p = {}",
            outcome.p_value
        );
    }

    #[test]
    fn test_ljung_box_detects_ar1() {
        let noise = white_noise(300, 13);
        let mut values = vec![0.0; 300];
        for t in 1..300 {
            values[t] = 0.8 * values[t - 1] + noise[t];
        }
        let outcome = ljung_box(&values, 12, 0).unwrap();
        assert!(outcome.p_value < 0.01);
    }

    #[test]
    fn test_box_pierce_close_to_ljung_box() {
        let values = white_noise(400, 99);
        let bp = box_pierce(&values, 10, 0).unwrap();
        let lb = ljung_box(&values, 10, 0).unwrap();
        // Same direction, Ljung-Box slightly larger on finite samples
        assert!(lb.statistic >= bp.statistic);
        assert_eq!(bp.lags, 10);
    }

    #[test]
    fn test_portmanteau_rejects_bad_lags() {
        let values = white_noise(100, 5);
        assert!(ljung_box(&values, 0, 0).is_err());
        assert!(ljung_box(&values, 3, 3).is_err());
    }

    #[test]
    fn test_adf_white_noise_is_stationary() {
        let values = white_noise(400, 21);
        let outcome = adf_test(&values, Some(2)).unwrap();
        assert!(
            outcome.p_value < 0.05,
            "ADF failed to reject unit root on white noise: p = {}",
            outcome.p_value
        );
    }

    #[test]
    fn test_adf_random_walk_has_unit_root() {
        let values = random_walk(400, 21);
        let outcome = adf_test(&values, Some(2)).unwrap();
        assert!(
            outcome.p_value > 0.05,
            "ADF rejected unit root on a random walk: p = {}",
            outcome.p_value
        );
    }

    #[test]
    fn test_kpss_white_noise_is_stationary() {
        let values = white_noise(400, 77);
        let outcome = kpss_test(&values, None).unwrap();
        assert!(
            outcome.p_value > 0.05,
            "KPSS rejected stationarity on white noise: p = {}",
            outcome.p_value
        );
    }

    #[test]
    fn test_kpss_random_walk_is_not_stationary() {
        let values = random_walk(400, 77);
        let outcome = kpss_test(&values, None).unwrap();
        assert!(
            outcome.p_value < 0.05,
            "KPSS failed to reject stationarity on a random walk: p = {}",
            outcome.p_value
        );
    }

    #[test]
    fn test_outcome_rejects_null() {
        let outcome = TestOutcome {
            statistic: 10.0,
            p_value: 0.01,
            lags: 5,
        };
        assert!(outcome.rejects_null(0.05));
        assert!(!outcome.rejects_null(0.005));
    }
}
