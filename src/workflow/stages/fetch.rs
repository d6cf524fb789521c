use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::error::{AppError, Result};
use crate::service::{Reply, ServiceClient};
use crate::workflow::aggregate::ErrorAggregate;
use crate::workflow::context::ResultContext;

use super::Stage;

/// Loads the home page assets in parallel, the way a browser would.
pub struct AssetFetchStage {
    client: ServiceClient,
    paths: Vec<String>,
}

impl AssetFetchStage {
    pub fn new(client: ServiceClient, paths: Vec<String>) -> Self {
        Self { client, paths }
    }

    /// Fire one GET per path and wait for all of them.
    ///
    /// Dropping the returned future aborts whatever requests are still in
    /// flight, since the tasks live in a `JoinSet`.
    pub async fn fetch_all(&self) -> ErrorAggregate {
        let mut tasks = JoinSet::new();

        for path in &self.paths {
            let client = self.client.clone();
            let path = path.clone();
            tasks.spawn(async move {
                let result = client.get(&path).await.and_then(Reply::success);
                if let Err(e) = &result {
                    tracing::debug!(path = %path, error = %e, "Asset fetch failed");
                }
                result.map(|_| ())
            });
        }

        let mut aggregate = ErrorAggregate::new(self.paths.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => aggregate.push(e),
                Err(e) => aggregate.push(AppError::Join(e)),
            }
        }
        aggregate
    }
}

#[async_trait]
impl Stage for AssetFetchStage {
    fn name(&self) -> &str {
        "fetch_assets"
    }

    async fn run(&self, ctx: ResultContext) -> Result<ResultContext> {
        self.fetch_all().await.into_result()?;
        Ok(ctx)
    }
}
