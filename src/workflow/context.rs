use crate::error::{AppError, Result};
use crate::service::types::{JobHandle, JobStatus};

/// Data handed from one stage to the next within a single iteration.
///
/// Stages take the context by value and return a new one with their
/// contributions added. The job handle can be set once and never replaced.
#[derive(Debug, Clone, Default)]
pub struct ResultContext {
    job: Option<JobHandle>,
    status: Option<JobStatus>,
    payload: Option<Vec<u8>>,
}

impl ResultContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job(self, job: JobHandle) -> Result<Self> {
        if let Some(existing) = &self.job {
            return Err(AppError::Context(format!(
                "job handle already set to {existing}, refusing to replace it with {job}"
            )));
        }
        Ok(Self {
            job: Some(job),
            ..self
        })
    }

    pub fn with_status(self, status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..self
        }
    }

    /// Raw body of the submission response.
    pub fn with_payload(self, payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
            ..self
        }
    }

    pub fn job(&self) -> Result<&JobHandle> {
        self.job
            .as_ref()
            .ok_or_else(|| AppError::Context("no job handle has been submitted yet".to_string()))
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.status
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }
}
