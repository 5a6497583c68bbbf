//! Deployment job types
//!
//! Mirrors the job lifecycle reported by the hosting service:
//! `PENDING → PROVISIONING → RUNNING → {SUCCEED, FAILED, CANCELLED}`.

use serde::Deserialize;
use std::fmt;

/// Status of a deployment job as reported by Amplify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum JobStatus {
    Pending,
    Provisioning,
    Running,
    /// Amplify spells this `SUCCEED`
    Succeeded,
    Failed,
    Cancelling,
    Cancelled,
    Unknown,
}

impl JobStatus {
    /// Parse the raw status string returned by the CLI
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "PROVISIONING" => Self::Provisioning,
            "RUNNING" => Self::Running,
            "SUCCEED" | "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "CANCELLING" => Self::Cancelling,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    /// No further transitions will happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    /// Jobs in these states are stopped before a new deployment starts
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Provisioning => "PROVISIONING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelling => "CANCELLING",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `list-jobs`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub job_type: Option<String>,
}

/// A freshly created manual deployment: where to upload and which job to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTicket {
    pub job_id: String,
    pub zip_upload_url: String,
}

/// How the poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded,
    /// FAILED or CANCELLED
    Failed(JobStatus),
    /// Deadline passed without a terminal status; the job may still be running
    TimedOut { last_status: JobStatus },
}

impl PollOutcome {
    pub fn from_status(status: JobStatus) -> Option<Self> {
        match status {
            JobStatus::Succeeded => Some(Self::Succeeded),
            other if other.is_terminal() => Some(Self::Failed(other)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amplify_spelling() {
        assert_eq!(JobStatus::parse("SUCCEED"), JobStatus::Succeeded);
        assert_eq!(JobStatus::parse("succeeded\n"), JobStatus::Succeeded);
        assert_eq!(JobStatus::parse("RUNNING"), JobStatus::Running);
        assert_eq!(JobStatus::parse("WHATEVER"), JobStatus::Unknown);
    }

    #[test]
    fn test_terminal_and_active_sets() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Cancelling.is_terminal());
        assert!(!JobStatus::Unknown.is_terminal());

        assert!(JobStatus::Pending.is_active());
        assert!(JobStatus::Running.is_active());
        assert!(!JobStatus::Provisioning.is_active());
        assert!(!JobStatus::Succeeded.is_active());
    }

    #[test]
    fn test_job_summary_deserialization() {
        let json = r#"{"jobId":"7","status":"SUCCEED","jobType":"MANUAL","commitId":"HEAD"}"#;
        let summary: JobSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.job_id, "7");
        assert_eq!(summary.status, JobStatus::Succeeded);
        assert_eq!(summary.job_type.as_deref(), Some("MANUAL"));

        let odd: JobSummary = serde_json::from_str(r#"{"jobId":"8","status":"NEW"}"#).unwrap();
        assert_eq!(odd.status, JobStatus::Unknown);
    }

    #[test]
    fn test_poll_outcome_from_status() {
        assert_eq!(
            PollOutcome::from_status(JobStatus::Succeeded),
            Some(PollOutcome::Succeeded)
        );
        assert_eq!(
            PollOutcome::from_status(JobStatus::Cancelled),
            Some(PollOutcome::Failed(JobStatus::Cancelled))
        );
        assert_eq!(PollOutcome::from_status(JobStatus::Running), None);
    }
}
