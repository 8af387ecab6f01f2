//! Core analysis library for the mensal sales walkthrough.
//!
//! This crate provides the time series operations the walkthrough binary
//! sequences: CSV ingestion, regular/irregular series construction,
//! seasonal decomposition, automatic ARIMA forecasting, gap regularization,
//! anomaly detection, and autocorrelation/stationarity tests.

pub mod anomaly;
pub mod arima;
pub mod decompose;
pub mod error;
pub mod ingest;
pub mod ols;
pub mod regularize;
pub mod series;
pub mod stattest;
pub mod summary;

// Re-exports for convenience
pub use anomaly::{detect_anomalies, Anomaly, AnomalyOptions, Direction};
pub use arima::{auto_arima, ArimaForecast, ArimaOrder, ArimaSpec};
pub use decompose::{decompose, Decomposition, DecompositionModel};
pub use error::{AnalysisError, Result};
pub use ingest::{parse_grouped_number, read_sales_csv, read_sales_records, SalesRecord};
pub use regularize::{
    align_to_month_grid, month_span, regularize, regularize_locf, FillMethod, MonthGrid,
};
pub use series::{DatedSeries, MonthlySeries};
pub use stattest::{acf, adf_test, box_pierce, kpss_test, ljung_box, TestOutcome};
pub use summary::{summarize, SeriesSummary};
