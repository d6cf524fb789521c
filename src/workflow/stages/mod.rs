pub mod fetch;
pub mod poll;
pub mod submit;
pub mod verify;

use async_trait::async_trait;

use crate::error::Result;
use crate::workflow::context::ResultContext;

pub use fetch::AssetFetchStage;
pub use poll::PollStage;
pub use submit::JobSubmissionStage;
pub use verify::VerificationStage;

/// One step of the emojify workflow.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    /// Consume the context produced by the previous stage and return it with
    /// this stage's contributions added.
    async fn run(&self, ctx: ResultContext) -> Result<ResultContext>;
}
