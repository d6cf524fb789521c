use async_trait::async_trait;

use crate::error::Result;
use crate::service::{endpoint, ServiceClient};
use crate::workflow::context::ResultContext;

use super::Stage;

/// Confirms the emojified image can be fetched from the cache.
pub struct VerificationStage {
    client: ServiceClient,
    artifact_path: String,
}

impl VerificationStage {
    pub fn new(client: ServiceClient, artifact_path: String) -> Self {
        Self {
            client,
            artifact_path,
        }
    }
}

#[async_trait]
impl Stage for VerificationStage {
    fn name(&self) -> &str {
        "verify_artifact"
    }

    async fn run(&self, ctx: ResultContext) -> Result<ResultContext> {
        let path = endpoint(&self.artifact_path, ctx.job()?);
        self.client.get(&path).await?.ok()?;
        Ok(ctx)
    }
}
