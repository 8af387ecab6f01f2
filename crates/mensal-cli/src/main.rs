//! Walkthrough binary: loads a monthly sales CSV, then runs summary
//! statistics, decomposition, auto-ARIMA forecasting, a gap-repair detour,
//! anomaly detection and stationarity diagnostics, writing one PNG per
//! stage along the way.

mod plot;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use mensal_core::{
    adf_test, auto_arima, box_pierce, decompose, detect_anomalies, kpss_test, ljung_box,
    read_sales_csv, regularize, summarize, AnomalyOptions, ArimaForecast, ArimaSpec,
    DecompositionModel, Direction, FillMethod, MonthlySeries,
};

#[derive(Parser, Debug)]
#[command(name = "mensal", version, about = "Monthly sales time series walkthrough")]
struct Args {
    /// CSV file with Year, Month and Sales columns
    #[arg(long, default_value = "data/sales.csv")]
    input: PathBuf,

    /// Directory for the generated charts
    #[arg(long, default_value = "plots")]
    out_dir: PathBuf,

    /// Forecast horizon in months
    #[arg(long, default_value_t = 12)]
    horizon: usize,

    /// Prediction interval coverage, e.g. 0.95
    #[arg(long, default_value_t = 0.95)]
    confidence: f64,

    /// Seasonal period
    #[arg(long, default_value_t = 12)]
    period: usize,

    /// Decomposition model: additive or multiplicative
    #[arg(long, default_value = "multiplicative")]
    model: DecompositionModel,

    /// Month (YYYY-MM) to remove before the gap-repair stage; repeatable.
    /// Defaults to two interior months when omitted.
    #[arg(long = "knock-out", value_parser = parse_month)]
    knock_out: Vec<NaiveDate>,

    /// Gap fill method: locf, nocb, mean or interpolate
    #[arg(long, default_value = "locf")]
    fill: FillMethod,
}

fn parse_month(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a YYYY-MM month", s))
}

fn print_forecast(dates: &[NaiveDate], forecast: &ArimaForecast) {
    println!(
        "  model: {}  (AIC {:.2}, sigma^2 {:.2})",
        forecast.model_name, forecast.aic, forecast.sigma2
    );
    println!("  {:>8}  {:>12}  {:>12}  {:>12}", "month", "lower", "point", "upper");
    for (k, date) in dates.iter().enumerate() {
        println!(
            "  {:>8}  {:>12.1}  {:>12.1}  {:>12.1}",
            date.format("%Y-%m"),
            forecast.lower[k],
            forecast.point[k],
            forecast.upper[k]
        );
    }
}

fn print_test(name: &str, outcome: &mensal_core::TestOutcome) {
    println!(
        "  {:<12} statistic {:>9.3}  p-value {:>6.3}  (lags {})",
        name, outcome.statistic, outcome.p_value, outcome.lags
    );
}

fn run(args: &Args) -> Result<()> {
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    // 1. Ingest
    let records = read_sales_csv(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let series = MonthlySeries::from_records(&records)?;
    let (y0, m0) = series.month_at(0);
    let (y1, m1) = series.month_at(series.len() - 1);
    println!("== Input ==");
    println!(
        "  {} observations, {:04}-{:02} through {:04}-{:02}",
        series.len(),
        y0,
        m0,
        y1,
        m1
    );

    // 2. Summary statistics
    let stats = summarize(series.values())?;
    println!("== Summary ==");
    println!("  mean {:.1}  std dev {:.1}", stats.mean, stats.std_dev);
    println!(
        "  min {:.1}  q1 {:.1}  median {:.1}  q3 {:.1}  max {:.1}",
        stats.min, stats.q1, stats.median, stats.q3, stats.max
    );

    let months = series.months();
    plot::line_chart(
        &args.out_dir.join("sales.png"),
        "Monthly sales",
        &months,
        series.values(),
    )?;

    // 3. Seasonal decomposition
    let dec = decompose(series.values(), args.period, args.model)?;
    println!("== Decomposition ({}) ==", args.model.name());
    for phase in 0..args.period.min(series.len()) {
        let (_, month) = series.month_at(phase);
        println!("  month {:>2}: seasonal {:.4}", month, dec.seasonal[phase]);
    }
    plot::decomposition_chart(
        &args.out_dir.join("decomposition.png"),
        "Observed",
        &months,
        series.values(),
        &dec,
    )?;

    // 4. Forecast
    let spec = ArimaSpec {
        horizon: args.horizon,
        confidence_level: args.confidence,
        period: args.period,
        ..ArimaSpec::default()
    };
    let forecast = auto_arima(series.values(), &spec)?;
    let future: Vec<NaiveDate> = (0..args.horizon)
        .map(|k| series.date_at(series.len() + k))
        .collect();
    println!("== Forecast ==");
    print_forecast(&future, &forecast);

    let mut full_dates = months.clone();
    full_dates.extend(&future);
    plot::forecast_chart(
        &args.out_dir.join("forecast.png"),
        "Sales forecast",
        &full_dates,
        series.values(),
        &forecast,
    )?;

    // 5. Knock out months and repair the gaps with LOCF
    let knock_out: Vec<NaiveDate> = if args.knock_out.is_empty() {
        vec![
            series.date_at(series.len() / 3),
            series.date_at(2 * series.len() / 3),
        ]
    } else {
        args.knock_out.clone()
    };
    println!("== Gap repair ==");
    for date in &knock_out {
        println!("  removed {}", date.format("%Y-%m"));
    }

    let irregular = series.to_dated().without_months(&knock_out)?;
    let repaired = regularize(&irregular, args.fill)?;
    let repaired_months = repaired.months();
    for date in &knock_out {
        if let Some(k) = repaired_months.iter().position(|d| d == date) {
            println!(
                "  {} filled with {:.1} ({})",
                date.format("%Y-%m"),
                repaired.values()[k],
                args.fill.name()
            );
        }
    }

    // 6. Decompose and forecast the repaired series. Knocking out an edge
    // month shortens the grid, so the chart axes come from the repaired
    // series itself.
    let repaired_dec = decompose(repaired.values(), args.period, args.model)?;
    plot::decomposition_chart(
        &args.out_dir.join("decomposition_repaired.png"),
        "Repaired",
        &repaired_months,
        repaired.values(),
        &repaired_dec,
    )?;

    let repaired_forecast = auto_arima(repaired.values(), &spec)?;
    let repaired_future: Vec<NaiveDate> = (0..args.horizon)
        .map(|k| repaired.date_at(repaired.len() + k))
        .collect();
    println!("== Forecast after repair ==");
    print_forecast(&repaired_future, &repaired_forecast);
    let mut repaired_full_dates = repaired_months.clone();
    repaired_full_dates.extend(&repaired_future);
    plot::forecast_chart(
        &args.out_dir.join("forecast_repaired.png"),
        "Sales forecast (repaired series)",
        &repaired_full_dates,
        repaired.values(),
        &repaired_forecast,
    )?;

    // 7. Anomaly detection on the repaired series
    let opts = AnomalyOptions {
        max_anoms: 0.1,
        direction: Direction::Positive,
        alpha: 0.05,
        period: args.period,
    };
    let anomalies = detect_anomalies(repaired.values(), &opts)?;
    println!("== Anomalies ==");
    if anomalies.is_empty() {
        println!("  no anomalies detected");
    } else {
        for a in &anomalies {
            let (year, month) = repaired.month_at(a.index);
            println!(
                "  {:04}-{:02}: value {:.1}, score {:+.2}",
                year, month, a.value, a.score
            );
        }
    }
    plot::anomaly_chart(
        &args.out_dir.join("anomalies.png"),
        "Anomalies",
        &repaired_months,
        repaired.values(),
        &anomalies,
    )?;

    // 8. Autocorrelation and stationarity diagnostics
    println!("== Diagnostics ==");
    let lags = args.period.min(series.len() / 2);
    print_test("Box-Pierce", &box_pierce(series.values(), lags, 0)?);
    print_test("Ljung-Box", &ljung_box(series.values(), lags, 0)?);
    print_test("ADF", &adf_test(series.values(), None)?);
    print_test("KPSS", &kpss_test(series.values(), None)?);

    let order = &forecast.order;
    let fitdf = order.p + order.q + order.sp + order.sq;
    if lags > fitdf {
        println!("  (residuals of {})", forecast.model_name);
        print_test("Ljung-Box", &ljung_box(&forecast.residuals, lags, fitdf)?);
    }

    println!("charts written to {}", args.out_dir.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    run(&args)
}
