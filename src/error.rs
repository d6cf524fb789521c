use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::workflow::aggregate::ErrorAggregate;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: StatusCode },

    #[error("Unexpected response from {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("{0}")]
    Aggregate(ErrorAggregate),

    #[error("Job {job_id} did not finish after {attempts} status checks")]
    PollExhausted { job_id: String, attempts: u32 },

    #[error("Job {job_id} reported status ERROR")]
    JobFailed { job_id: String },

    #[error("Iteration timed out after {0:?}")]
    IterationTimeout(Duration),

    #[error("Workflow context error: {0}")]
    Context(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Short machine-friendly label used when grouping failures in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Transport { .. } => "transport",
            AppError::Status { .. } => "status",
            AppError::Parse { .. } => "parse",
            AppError::Aggregate(_) => "aggregate",
            AppError::PollExhausted { .. } => "poll_exhausted",
            AppError::JobFailed { .. } => "job_failed",
            AppError::IterationTimeout(_) => "timeout",
            AppError::Context(_) => "context",
            AppError::Report(_) => "report",
            AppError::Join(_) => "join",
            AppError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
