use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::service::types::{JobStatus, StatusResponse};
use crate::service::{endpoint, ServiceClient};
use crate::workflow::context::ResultContext;

use super::Stage;

/// Polls the job status endpoint at a fixed interval until the job finishes.
///
/// Gives up with [`AppError::PollExhausted`] after `max_attempts` status
/// checks; a transport or status error, or a job reporting `ERROR`, stops
/// polling immediately.
pub struct PollStage {
    client: ServiceClient,
    status_path: String,
    interval: Duration,
    max_attempts: u32,
}

impl PollStage {
    pub fn new(
        client: ServiceClient,
        status_path: String,
        interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            client,
            status_path,
            interval,
            max_attempts,
        }
    }
}

#[async_trait]
impl Stage for PollStage {
    fn name(&self) -> &str {
        "poll_job"
    }

    async fn run(&self, ctx: ResultContext) -> Result<ResultContext> {
        let job = ctx.job()?.clone();
        let path = endpoint(&self.status_path, &job);

        for attempt in 1..=self.max_attempts {
            let reply = self.client.get(&path).await?.ok()?;
            let parsed: StatusResponse = reply.json()?;

            if let Some(id) = parsed.id.as_deref() {
                if id != job.as_str() {
                    tracing::warn!(job_id = %job, reported_id = id, "Status response names a different job");
                }
            }

            tracing::trace!(job_id = %job, attempt, status = ?parsed.status, "Polled job status");

            if parsed.status.is_terminal() {
                if parsed.status != JobStatus::Finished {
                    return Err(AppError::JobFailed {
                        job_id: job.to_string(),
                    });
                }
                tracing::debug!(job_id = %job, attempts = attempt, "Job finished");
                return Ok(ctx.with_status(JobStatus::Finished));
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Err(AppError::PollExhausted {
            job_id: job.to_string(),
            attempts: self.max_attempts,
        })
    }
}
