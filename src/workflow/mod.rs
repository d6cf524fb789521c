pub mod aggregate;
pub mod context;
pub mod stages;
pub mod types;

use std::time::Duration;

use crate::config::AppConfig;
use crate::error::Result;
use crate::service::ServiceClient;
use context::ResultContext;
use stages::{AssetFetchStage, JobSubmissionStage, PollStage, Stage, VerificationStage};
use types::WorkflowOutcome;

pub enum Step {
    Stage(Box<dyn Stage>),
    /// Unconditional sleep between stages.
    Pause(Duration),
}

/// Runs one emojify iteration: load the home page, submit a picture, wait
/// for the job, then fetch the result from the cache.
///
/// The first failing stage ends the iteration; later steps never run.
pub struct WorkflowRunner {
    steps: Vec<Step>,
}

impl WorkflowRunner {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Build the standard pipeline against the configured service.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = ServiceClient::new(&config.target.base_uri, config.request_timeout())?;
        let workflow = &config.workflow;

        let pictures = workflow
            .picture_paths
            .iter()
            .map(|p| {
                if p.starts_with("http://") || p.starts_with("https://") {
                    p.clone()
                } else {
                    client.url(p)
                }
            })
            .collect();

        let steps = vec![
            Step::Stage(Box::new(AssetFetchStage::new(
                client.clone(),
                workflow.asset_paths.clone(),
            ))),
            Step::Pause(workflow.settle_delay()),
            Step::Stage(Box::new(JobSubmissionStage::new(
                client.clone(),
                workflow.submit_path.clone(),
                pictures,
            ))),
            Step::Stage(Box::new(PollStage::new(
                client.clone(),
                workflow.status_path.clone(),
                workflow.poll_interval(),
                workflow.max_poll_attempts,
            ))),
            Step::Stage(Box::new(VerificationStage::new(
                client,
                workflow.artifact_path.clone(),
            ))),
        ];

        Ok(Self::new(steps))
    }

    /// Run every step in order, starting from an empty context.
    pub async fn execute(&self) -> Result<ResultContext> {
        let mut ctx = ResultContext::new();

        for step in &self.steps {
            match step {
                Step::Stage(stage) => {
                    ctx = match stage.run(ctx).await {
                        Ok(next) => next,
                        Err(e) => {
                            tracing::debug!(stage = stage.name(), error = %e, "Stage failed");
                            return Err(e);
                        }
                    };
                }
                Step::Pause(delay) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(*delay).await;
                    }
                }
            }
        }

        Ok(ctx)
    }

    pub async fn run(&self) -> WorkflowOutcome {
        self.execute().await.into()
    }
}
