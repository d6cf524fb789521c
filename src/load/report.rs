use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::OutputConfig;
use crate::error::Result;

use super::plot::{plot_latency, IterationPoint};
use super::sample::Sample;

/// Running totals over every recorded iteration.
#[derive(Debug, Default)]
pub struct Summary {
    started_at: Option<DateTime<Utc>>,
    wall_time: Duration,
    succeeded: usize,
    failed: usize,
    latencies: Vec<Duration>,
    timeline: Vec<IterationPoint>,
    failures_by_kind: BTreeMap<&'static str, usize>,
    error_log: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    pub min: Duration,
    pub mean: Duration,
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
    pub max: Duration,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sample: Sample) {
        self.started_at = Some(match self.started_at {
            Some(first) => first.min(sample.started_at),
            None => sample.started_at,
        });
        self.latencies.push(sample.elapsed);
        self.timeline.push(IterationPoint {
            started_at: sample.started_at,
            elapsed: sample.elapsed,
            succeeded: sample.is_success(),
        });

        match sample.failure {
            None => self.succeeded += 1,
            Some(failure) => {
                self.failed += 1;
                *self.failures_by_kind.entry(failure.kind).or_default() += 1;
                self.error_log.push(format!(
                    "{} user={} elapsed={}ms {}",
                    sample.started_at.to_rfc3339(),
                    sample.user,
                    sample.elapsed.as_millis(),
                    failure.message
                ));
            }
        }
    }

    /// Set the wall-clock length of the run, used for throughput.
    pub fn finish(&mut self, wall_time: Duration) {
        self.wall_time = wall_time;
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn failures_by_kind(&self) -> &BTreeMap<&'static str, usize> {
        &self.failures_by_kind
    }

    pub fn throughput(&self) -> f64 {
        let secs = self.wall_time.as_secs_f64();
        if secs > 0.0 {
            self.total() as f64 / secs
        } else {
            0.0
        }
    }

    pub fn latency(&self) -> Option<LatencyStats> {
        if self.latencies.is_empty() {
            return None;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();

        let sum: Duration = sorted.iter().sum();
        let mean = sum / sorted.len() as u32;

        Some(LatencyStats {
            min: sorted[0],
            mean,
            p50: nearest_rank(&sorted, 50.0),
            p90: nearest_rank(&sorted, 90.0),
            p99: nearest_rank(&sorted, 99.0),
            max: sorted[sorted.len() - 1],
        })
    }

    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let started = self
            .started_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        let success_rate = if self.total() > 0 {
            self.succeeded as f64 * 100.0 / self.total() as f64
        } else {
            0.0
        };

        let _ = writeln!(out, "{:<20}{}", "Start Time:", started);
        let _ = writeln!(out, "{:<20}{:.1}s", "Total Duration:", self.wall_time.as_secs_f64());
        let _ = writeln!(out, "{:<20}{}", "Total Iterations:", self.total());
        let _ = writeln!(out, "{:<20}{}", "Succeeded:", self.succeeded);
        let _ = writeln!(out, "{:<20}{}", "Failed:", self.failed);
        let _ = writeln!(out, "{:<20}{:.1}%", "Success Rate:", success_rate);
        let _ = writeln!(out, "{:<20}{:.2} iterations/s", "Throughput:", self.throughput());

        if let Some(stats) = self.latency() {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{:>10}{:>10}{:>10}{:>10}{:>10}{:>10}",
                "min", "mean", "p50", "p90", "p99", "max"
            );
            let _ = writeln!(
                out,
                "{:>10}{:>10}{:>10}{:>10}{:>10}{:>10}",
                millis(stats.min),
                millis(stats.mean),
                millis(stats.p50),
                millis(stats.p90),
                millis(stats.p99),
                millis(stats.max)
            );
        }

        if !self.failures_by_kind.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Failures:");
            for (kind, count) in &self.failures_by_kind {
                let _ = writeln!(out, "  {kind:<18}{count}");
            }
        }

        out
    }

    pub fn render_error_log(&self) -> String {
        let mut out = self.error_log.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Write the table, error log and latency chart to the configured files.
    pub async fn save(&self, output: &OutputConfig) -> Result<()> {
        tokio::fs::write(&output.table_path, self.render_table()).await?;
        tokio::fs::write(&output.error_log_path, self.render_error_log()).await?;

        let points = self.timeline.clone();
        let plot_path = output.plot_path.clone();
        tokio::task::spawn_blocking(move || plot_latency(&points, &plot_path)).await??;
        Ok(())
    }
}

fn nearest_rank(sorted: &[Duration], percentile: f64) -> Duration {
    let rank = (percentile * sorted.len() as f64 / 100.0).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

fn millis(d: Duration) -> String {
    format!("{}ms", d.as_millis())
}
