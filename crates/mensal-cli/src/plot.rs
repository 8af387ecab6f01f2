//! PNG charts for the walkthrough output.

use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use mensal_core::{Anomaly, ArimaForecast, Decomposition};
use plotters::coord::Shift;
use plotters::prelude::*;

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 576;

fn padded_range(slices: &[&[f64]]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for slice in slices {
        for &v in *slice {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(1e-9);
    (min - pad, max + pad)
}

fn month_label(dates: &[NaiveDate], x: f64) -> String {
    let idx = x.round() as i64;
    if idx >= 0 && (idx as usize) < dates.len() {
        dates[idx as usize].format("%Y-%m").to_string()
    } else {
        String::new()
    }
}

fn draw_line_panel(
    area: &DrawingArea<BitMapBackend, Shift>,
    title: &str,
    dates: &[NaiveDate],
    values: &[f64],
    color: &RGBColor,
) -> Result<()> {
    let (lo, hi) = padded_range(&[values]);
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(8)
        .x_label_area_size(28)
        .y_label_area_size(56)
        .build_cartesian_2d(0f64..(values.len().max(2) - 1) as f64, lo..hi)
        .map_err(|e| anyhow!("chart layout: {}", e))?;

    chart
        .configure_mesh()
        .x_label_formatter(&|x| month_label(dates, *x))
        .x_labels(8)
        .y_labels(6)
        .draw()
        .map_err(|e| anyhow!("chart mesh: {}", e))?;

    chart
        .draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
            color,
        ))
        .map_err(|e| anyhow!("line series: {}", e))?;
    Ok(())
}

/// Single line chart of a monthly series.
pub fn line_chart(path: &Path, title: &str, dates: &[NaiveDate], values: &[f64]) -> Result<()> {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill: {}", e))?;
    draw_line_panel(&root, title, dates, values, &BLUE)?;
    present(&root, path)
}

/// Four stacked panels: observed, trend, seasonal, remainder.
pub fn decomposition_chart(
    path: &Path,
    title: &str,
    dates: &[NaiveDate],
    observed: &[f64],
    decomposition: &Decomposition,
) -> Result<()> {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT * 2)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill: {}", e))?;
    let panels = root.split_evenly((4, 1));

    let rows: [(&str, &[f64], &RGBColor); 4] = [
        (title, observed, &BLUE),
        ("Trend", &decomposition.trend, &RED),
        ("Seasonal", &decomposition.seasonal, &GREEN),
        ("Remainder", &decomposition.remainder, &BLACK),
    ];
    for (panel, (name, values, color)) in panels.iter().zip(rows) {
        draw_line_panel(panel, name, dates, values, color)?;
    }
    present(&root, path)
}

/// History with point forecast and shaded prediction interval.
pub fn forecast_chart(
    path: &Path,
    title: &str,
    dates: &[NaiveDate],
    history: &[f64],
    forecast: &ArimaForecast,
) -> Result<()> {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill: {}", e))?;

    let n = history.len();
    let h = forecast.point.len();
    let total = n + h;
    let (lo, hi) = padded_range(&[history, &forecast.lower, &forecast.upper]);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(8)
        .x_label_area_size(28)
        .y_label_area_size(56)
        .build_cartesian_2d(0f64..(total.max(2) - 1) as f64, lo..hi)
        .map_err(|e| anyhow!("chart layout: {}", e))?;

    chart
        .configure_mesh()
        .x_label_formatter(&|x| month_label(dates, *x))
        .x_labels(8)
        .y_labels(6)
        .draw()
        .map_err(|e| anyhow!("chart mesh: {}", e))?;

    // Interval band first so the lines sit on top of it.
    let mut band: Vec<(f64, f64)> = (0..h)
        .map(|k| ((n + k) as f64, forecast.upper[k]))
        .collect();
    band.extend((0..h).rev().map(|k| ((n + k) as f64, forecast.lower[k])));
    chart
        .draw_series(std::iter::once(Polygon::new(band, RED.mix(0.15))))
        .map_err(|e| anyhow!("interval band: {}", e))?;

    chart
        .draw_series(LineSeries::new(
            history.iter().enumerate().map(|(i, &v)| (i as f64, v)),
            &BLUE,
        ))
        .map_err(|e| anyhow!("history series: {}", e))?
        .label("observed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], BLUE));

    chart
        .draw_series(LineSeries::new(
            forecast
                .point
                .iter()
                .enumerate()
                .map(|(k, &v)| ((n + k) as f64, v)),
            &RED,
        ))
        .map_err(|e| anyhow!("forecast series: {}", e))?
        .label(&forecast.model_name)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], RED));

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(|e| anyhow!("legend: {}", e))?;

    present(&root, path)
}

/// Series line with flagged anomalies circled.
pub fn anomaly_chart(
    path: &Path,
    title: &str,
    dates: &[NaiveDate],
    values: &[f64],
    anomalies: &[Anomaly],
) -> Result<()> {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill: {}", e))?;

    let (lo, hi) = padded_range(&[values]);
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 18))
        .margin(8)
        .x_label_area_size(28)
        .y_label_area_size(56)
        .build_cartesian_2d(0f64..(values.len().max(2) - 1) as f64, lo..hi)
        .map_err(|e| anyhow!("chart layout: {}", e))?;

    chart
        .configure_mesh()
        .x_label_formatter(&|x| month_label(dates, *x))
        .x_labels(8)
        .y_labels(6)
        .draw()
        .map_err(|e| anyhow!("chart mesh: {}", e))?;

    chart
        .draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
            &BLUE,
        ))
        .map_err(|e| anyhow!("line series: {}", e))?;

    chart
        .draw_series(
            anomalies
                .iter()
                .map(|a| Circle::new((a.index as f64, a.value), 5, RED.stroke_width(2))),
        )
        .map_err(|e| anyhow!("anomaly markers: {}", e))?;

    present(&root, path)
}

fn present(root: &DrawingArea<BitMapBackend, Shift>, path: &Path) -> Result<()> {
    root.present()
        .map_err(|e| anyhow!("writing {}: {}", path.display(), e))
}
