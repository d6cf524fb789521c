use crate::error::{AppError, Result};

/// Outcome of one workflow iteration.
#[derive(Debug)]
pub enum WorkflowOutcome {
    /// Every stage completed.
    Success,
    /// The first failing stage stopped the iteration.
    Failure { cause: AppError },
}

impl WorkflowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowOutcome::Success)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            WorkflowOutcome::Success => Ok(()),
            WorkflowOutcome::Failure { cause } => Err(cause),
        }
    }
}

impl<T> From<Result<T>> for WorkflowOutcome {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(_) => WorkflowOutcome::Success,
            Err(cause) => WorkflowOutcome::Failure { cause },
        }
    }
}
