use async_trait::async_trait;
use rand::seq::SliceRandom;

use crate::error::{AppError, Result};
use crate::service::types::{JobHandle, SubmitResponse};
use crate::service::ServiceClient;
use crate::workflow::context::ResultContext;

use super::Stage;

/// Posts a picture URL to the emojify API and records the job it creates.
pub struct JobSubmissionStage {
    client: ServiceClient,
    submit_path: String,
    pictures: Vec<String>,
}

impl JobSubmissionStage {
    /// `pictures` are full URLs; one is picked at random per submission.
    pub fn new(client: ServiceClient, submit_path: String, pictures: Vec<String>) -> Self {
        Self {
            client,
            submit_path,
            pictures,
        }
    }

    fn pick_picture(&self) -> Result<String> {
        self.pictures
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| AppError::Config("no pictures configured for submission".to_string()))
    }
}

#[async_trait]
impl Stage for JobSubmissionStage {
    fn name(&self) -> &str {
        "submit_job"
    }

    async fn run(&self, ctx: ResultContext) -> Result<ResultContext> {
        let picture = self.pick_picture()?;
        tracing::debug!(picture = %picture, "Submitting emojify job");

        let reply = self.client.post_text(&self.submit_path, picture).await?.ok()?;
        let parsed: SubmitResponse = reply.json()?;

        if parsed.id.trim().is_empty() {
            return Err(AppError::Parse {
                url: reply.url,
                reason: "response carried an empty job id".to_string(),
            });
        }

        tracing::debug!(job_id = %parsed.id, "Job submitted");

        ctx.with_payload(reply.body)
            .with_job(JobHandle::new(parsed.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{unreachable_base_uri, Behavior, MockService};
    use axum::http::StatusCode;
    use std::time::Duration;

    fn pictures(base_uri: &str) -> Vec<String> {
        (1..=5)
            .map(|n| format!("{base_uri}/pictures/{n}.jpg"))
            .collect()
    }

    #[tokio::test]
    async fn test_submit_records_job_handle() {
        let mock = MockService::start(Behavior::default()).await;
        let candidates = pictures(&mock.base_uri);
        let stage = JobSubmissionStage::new(
            mock.client(),
            "/v2/api/emojify/".to_string(),
            candidates.clone(),
        );

        let ctx = stage.run(ResultContext::new()).await.unwrap();

        assert_eq!(ctx.job().unwrap().as_str(), "job-42");
        assert_eq!(ctx.payload(), Some(&br#"{"id":"job-42"}"#[..]));

        let submissions = mock.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        let (content_type, body) = &submissions[0];
        assert_eq!(content_type.as_deref(), Some("text/plain"));
        assert!(candidates.contains(body));
    }

    #[tokio::test]
    async fn test_non_200_is_status_error() {
        let mock = MockService::start(Behavior {
            submit_status: StatusCode::CREATED,
            ..Behavior::default()
        })
        .await;
        let stage = JobSubmissionStage::new(
            mock.client(),
            "/v2/api/emojify/".to_string(),
            pictures(&mock.base_uri),
        );

        let err = stage.run(ResultContext::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Status { status, .. } if status == StatusCode::CREATED));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mock = MockService::start(Behavior {
            submit_body: "<html>oops</html>".to_string(),
            ..Behavior::default()
        })
        .await;
        let stage = JobSubmissionStage::new(
            mock.client(),
            "/v2/api/emojify/".to_string(),
            pictures(&mock.base_uri),
        );

        let err = stage.run(ResultContext::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_empty_id_is_parse_error() {
        let mock = MockService::start(Behavior {
            submit_body: r#"{"id":""}"#.to_string(),
            ..Behavior::default()
        })
        .await;
        let stage = JobSubmissionStage::new(
            mock.client(),
            "/v2/api/emojify/".to_string(),
            pictures(&mock.base_uri),
        );

        let err = stage.run(ResultContext::new()).await.unwrap_err();
        assert!(err.to_string().contains("empty job id"));
    }

    #[tokio::test]
    async fn test_transport_error_is_reported() {
        let base_uri = unreachable_base_uri().await;
        let client = ServiceClient::new(&base_uri, Duration::from_secs(2)).unwrap();
        let stage = JobSubmissionStage::new(
            client,
            "/v2/api/emojify/".to_string(),
            pictures(&base_uri),
        );

        let err = stage.run(ResultContext::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Transport { .. }));
    }
}
