pub mod plot;
pub mod report;
pub mod sample;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::config::LoadConfig;
use crate::error::AppError;
use crate::workflow::WorkflowRunner;

use report::Summary;
use sample::Sample;

/// Drives many independent virtual users through the workflow.
pub struct LoadTest {
    runner: Arc<WorkflowRunner>,
    settings: LoadConfig,
}

impl LoadTest {
    pub fn new(runner: Arc<WorkflowRunner>, settings: LoadConfig) -> Self {
        Self { runner, settings }
    }

    /// Run until the configured duration elapses or `shutdown` resolves.
    ///
    /// Users stop starting new iterations once either happens; iterations
    /// already in flight run to completion or to their timeout.
    pub async fn run<F>(&self, shutdown: F) -> Summary
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let deadline = started + self.settings.duration();
        let (sample_tx, mut sample_rx) = mpsc::unbounded_channel::<Sample>();
        let (stop_tx, stop_rx) = watch::channel(false);

        tracing::info!(
            users = self.settings.users,
            duration_secs = self.settings.duration_secs,
            timeout_secs = self.settings.timeout_secs,
            "Starting load test"
        );

        for user in 0..self.settings.users {
            let start_delay = ramp_delay(self.settings.ramp_up(), user, self.settings.users);
            let user_run = VirtualUser {
                id: user,
                runner: Arc::clone(&self.runner),
                samples: sample_tx.clone(),
                stop: stop_rx.clone(),
                deadline,
                iteration_timeout: self.settings.iteration_timeout(),
            };
            tokio::spawn(user_run.run(start_delay));
        }
        drop(sample_tx);

        let mut summary = Summary::new();
        let bar = progress_bar(&self.settings);
        let mut progress = tokio::time::interval(self.settings.progress_interval());
        progress.tick().await;
        let mut stopping = false;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                sample = sample_rx.recv() => {
                    match sample {
                        Some(sample) => summary.record(sample),
                        // Every user has exited
                        None => break,
                    }
                }
                _ = &mut shutdown, if !stopping => {
                    tracing::info!("Shutdown requested, waiting for in-flight iterations");
                    stopping = true;
                    let _ = stop_tx.send(true);
                }
                _ = progress.tick() => {
                    let elapsed_secs = started.elapsed().as_secs();
                    bar.set_position(elapsed_secs.min(self.settings.duration_secs));
                    bar.set_message(format!(
                        "{} iterations, {} failed",
                        summary.total(),
                        summary.failed()
                    ));
                    tracing::debug!(
                        elapsed_secs,
                        completed = summary.total(),
                        failed = summary.failed(),
                        "Progress"
                    );
                }
            }
        }

        summary.finish(started.elapsed());
        bar.finish_with_message(format!(
            "{} iterations, {} failed",
            summary.total(),
            summary.failed()
        ));

        tracing::info!(
            total = summary.total(),
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "Load test complete"
        );

        summary
    }
}

struct VirtualUser {
    id: usize,
    runner: Arc<WorkflowRunner>,
    samples: mpsc::UnboundedSender<Sample>,
    stop: watch::Receiver<bool>,
    deadline: Instant,
    iteration_timeout: Duration,
}

impl VirtualUser {
    async fn run(mut self, start_delay: Duration) {
        if !start_delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(start_delay) => {}
                _ = self.stop.changed() => {}
            }
        }

        tracing::debug!(user = self.id, "Virtual user started");

        while !*self.stop.borrow() && Instant::now() < self.deadline {
            let started_at = Utc::now();
            let start = Instant::now();

            let result = match tokio::time::timeout(self.iteration_timeout, self.runner.run()).await
            {
                Ok(outcome) => outcome.into_result(),
                Err(_) => Err(AppError::IterationTimeout(self.iteration_timeout)),
            };

            if let Err(e) = &result {
                tracing::warn!(user = self.id, kind = e.kind(), error = %e, "Iteration failed");
            }

            let sample = Sample::new(self.id, started_at, start.elapsed(), result);
            if self.samples.send(sample).is_err() {
                break;
            }
        }

        tracing::debug!(user = self.id, "Virtual user finished");
    }
}

/// Bar over the test duration in seconds; hidden unless progress is enabled.
fn progress_bar(settings: &LoadConfig) -> ProgressBar {
    if !settings.show_progress {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(settings.duration_secs);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}s {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Spread user start times evenly across the ramp-up window.
fn ramp_delay(ramp_up: Duration, user: usize, users: usize) -> Duration {
    if users == 0 {
        return Duration::ZERO;
    }
    ramp_up.mul_f64(user as f64 / users as f64)
}
