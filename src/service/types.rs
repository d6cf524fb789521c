use std::fmt;

use serde::Deserialize;

/// Identifier the service assigns to an asynchronous emojify job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Finished,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Error)
    }
}

// --- Response types ---

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_parses_known_status() {
        let parsed: StatusResponse =
            serde_json::from_str(r#"{"id":"job-42","status":"PROCESSING"}"#).unwrap();
        assert_eq!(parsed.id.as_deref(), Some("job-42"));
        assert_eq!(parsed.status, JobStatus::Processing);
        assert!(!parsed.status.is_terminal());
    }

    #[test]
    fn test_status_response_maps_unrecognised_status_to_unknown() {
        let parsed: StatusResponse =
            serde_json::from_str(r#"{"id":"job-42","status":"QUEUED"}"#).unwrap();
        assert_eq!(parsed.status, JobStatus::Unknown);

        let parsed: StatusResponse = serde_json::from_str(r#"{"id":"job-42"}"#).unwrap();
        assert_eq!(parsed.status, JobStatus::Unknown);
    }

    #[test]
    fn test_submit_response_requires_id() {
        assert!(serde_json::from_str::<SubmitResponse>(r#"{"status":"PENDING"}"#).is_err());
        let parsed: SubmitResponse = serde_json::from_str(r#"{"id":"job-42"}"#).unwrap();
        assert_eq!(parsed.id, "job-42");
    }
}
