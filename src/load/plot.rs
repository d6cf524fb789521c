//! Latency-over-time chart written next to the tabular report.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use plotters::prelude::*;

use crate::error::{AppError, Result};

/// One iteration as drawn on the chart.
#[derive(Debug, Clone, Copy)]
pub struct IterationPoint {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub succeeded: bool,
}

/// Plot iteration latency (ms) against start offset (s) as a PNG.
///
/// Successful iterations form a blue line, failures are red dots. The chart
/// carries no text so it renders without any system fonts.
pub fn plot_latency(points: &[IterationPoint], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let Some(start) = points.iter().map(|p| p.started_at).min() else {
        root.present().map_err(plot_error)?;
        return Ok(());
    };

    let mut data: Vec<(f64, f64, bool)> = points
        .iter()
        .map(|p| {
            let offset = (p.started_at - start).num_milliseconds() as f64 / 1000.0;
            (offset, p.elapsed.as_secs_f64() * 1000.0, p.succeeded)
        })
        .collect();
    data.sort_by(|a, b| a.0.total_cmp(&b.0));

    let max_x = data.iter().map(|d| d.0).fold(1.0, f64::max);
    let max_y = data.iter().map(|d| d.1).fold(1.0, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(0f64..max_x * 1.05, 0f64..max_y * 1.1)
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(
            data.iter().filter(|d| d.2).map(|d| (d.0, d.1)),
            &BLUE,
        ))
        .map_err(plot_error)?;

    chart
        .draw_series(
            data.iter()
                .filter(|d| !d.2)
                .map(|d| Circle::new((d.0, d.1), 3, RED.filled())),
        )
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

fn plot_error<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Report(format!("Failed to draw latency chart: {e}"))
}
