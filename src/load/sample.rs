use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Result of one workflow iteration as seen by the harness.
#[derive(Debug, Clone)]
pub struct Sample {
    pub user: usize,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub failure: Option<Failure>,
}

#[derive(Debug, Clone)]
pub struct Failure {
    pub kind: &'static str,
    pub message: String,
}

impl Sample {
    pub fn new(
        user: usize,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        result: Result<(), AppError>,
    ) -> Self {
        let failure = result.err().map(|e| Failure {
            kind: e.kind(),
            message: e.to_string(),
        });
        Self {
            user,
            started_at,
            elapsed,
            failure,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}
