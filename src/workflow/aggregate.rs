use std::fmt;

use crate::error::{AppError, Result};

/// Failures collected from a fan-out of concurrent requests.
///
/// Only the task that joins the fan-out pushes into it, so no locking is
/// needed. Order reflects completion order, not request order.
#[derive(Debug)]
pub struct ErrorAggregate {
    attempted: usize,
    errors: Vec<AppError>,
}

impl ErrorAggregate {
    pub fn new(attempted: usize) -> Self {
        Self {
            attempted,
            errors: Vec::new(),
        }
    }

    pub fn push(&mut self, error: AppError) {
        self.errors.push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    pub fn errors(&self) -> &[AppError] {
        &self.errors
    }

    /// `Ok` when nothing failed, otherwise the whole aggregate as one error.
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Aggregate(self))
        }
    }
}

impl fmt::Display for ErrorAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} requests failed", self.errors.len(), self.attempted)?;
        for (i, error) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_aggregate_is_success() {
        assert!(ErrorAggregate::new(5).into_result().is_ok());
    }

    #[test]
    fn test_display_lists_every_cause() {
        let mut aggregate = ErrorAggregate::new(5);
        aggregate.push(AppError::Context("first".to_string()));
        aggregate.push(AppError::Context("second".to_string()));

        let err = aggregate.into_result().unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("2 of 5 requests failed: "));
        assert!(message.contains("first"));
        assert!(message.contains("second"));
    }
}
