//! Centralized error types for amplify-deploy
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::JobStatus;

/// Top-level error for a deployment run, one variant per phase family
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Could not resolve app/branch: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Packaging failed: {0}")]
    Package(#[from] PackageError),

    #[error("Deployment failed: {0}")]
    Job(#[from] JobError),
}

impl DeployError {
    /// Remediation lines printed after the error
    pub fn hints(&self) -> Vec<String> {
        match self {
            Self::Precondition(PreconditionError::BuildDirMissing { .. }) => {
                vec!["Run the site build first (e.g. `npm run build`)".to_string()]
            }
            Self::Precondition(PreconditionError::InvalidBranch { .. }) => {
                vec!["Pass an environment name such as `dev` or `prod`".to_string()]
            }
            Self::Precondition(PreconditionError::CliUnavailable { .. }) => vec![
                "Install the AWS CLI: https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html".to_string(),
                "Or point AWS_BIN at an existing aws binary".to_string(),
            ],
            Self::Package(_) => {
                vec!["Check that the build directory is readable and the disk is not full".to_string()]
            }
            _ => vec![
                "Ensure your AWS credentials are configured: aws configure".to_string(),
                "Make sure you have permissions for the AWS Amplify service".to_string(),
                "Check your AWS region (AWS_DEFAULT_REGION, default: us-east-1)".to_string(),
                "Missing apps and branches are created automatically".to_string(),
            ],
        }
    }
}

/// Checks that run before anything is changed
#[derive(Error, Debug)]
pub enum PreconditionError {
    #[error("Build output not found at {}. Run the build first", .path.display())]
    BuildDirMissing { path: PathBuf },

    #[error("Invalid environment name '{name}': {reason}")]
    InvalidBranch { name: String, reason: String },

    #[error("AWS CLI is not installed or not in PATH: {source}")]
    CliUnavailable {
        #[source]
        source: CliError,
    },

    #[error("Cannot access AWS Amplify in {region}: {source}")]
    ServiceUnreachable {
        region: String,
        #[source]
        source: CliError,
    },
}

/// App/branch lookup-or-create failures
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Failed to list apps: {0}")]
    ListApps(#[source] CliError),

    #[error("Failed to create app {name}: {source}")]
    CreateApp {
        name: String,
        #[source]
        source: CliError,
    },

    #[error("Failed to look up branch {branch}: {source}")]
    GetBranch {
        branch: String,
        #[source]
        source: CliError,
    },

    #[error("Failed to create branch {branch}: {source}")]
    CreateBranch {
        branch: String,
        #[source]
        source: CliError,
    },

    #[error("Failed to read app {app_id}: {source}")]
    GetApp {
        app_id: String,
        #[source]
        source: CliError,
    },
}

/// Zipping the build output
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Failed to walk build directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error while packaging: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Job creation, upload, start and polling
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Failed to create deployment: {0}")]
    CreateDeployment(#[source] CliError),

    #[error("Deployment response had no upload URL or job ID")]
    MissingTicket,

    #[error("Failed to upload archive: {0}")]
    Upload(#[from] UploadError),

    #[error("Failed to start job {job_id}: {source}")]
    Start {
        job_id: String,
        #[source]
        source: CliError,
    },

    #[error("Failed to read status of job {job_id}: {source}")]
    Poll {
        job_id: String,
        #[source]
        source: CliError,
    },

    #[error("Job {job_id} finished with status {status}")]
    Terminal { job_id: String, status: JobStatus },

    #[error("Job {job_id} did not finish within {timeout_secs}s (last status {last_status})")]
    TimedOut {
        job_id: String,
        timeout_secs: u64,
        last_status: JobStatus,
    },
}

/// aws CLI invocation failures
#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to execute {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with code {}: {stderr}", .code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("unexpected output from `{command}`: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CliError {
    /// The service answered that the requested resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Failed { stderr, .. } if stderr.contains("NotFoundException"))
    }
}

/// HTTP upload of the archive
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read archive {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Configuration file problems
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(stderr: &str) -> CliError {
        CliError::Failed {
            command: "aws amplify get-branch".to_string(),
            code: Some(254),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_not_found_detection() {
        let err = failed("An error occurred (NotFoundException) when calling the GetBranch operation");
        assert!(err.is_not_found());
        assert!(!failed("An error occurred (AccessDeniedException)").is_not_found());
    }

    #[test]
    fn test_error_conversion() {
        let err: DeployError = JobError::MissingTicket.into();
        assert!(matches!(err, DeployError::Job(JobError::MissingTicket)));
    }

    #[test]
    fn test_cli_failure_display() {
        let message = failed("boom").to_string();
        assert!(message.contains("254"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_hints_by_kind() {
        let missing: DeployError = PreconditionError::BuildDirMissing {
            path: PathBuf::from("dist"),
        }
        .into();
        assert!(missing.hints()[0].contains("build"));

        let resolution: DeployError = ResolutionError::ListApps(failed("denied")).into();
        assert!(resolution.hints().iter().any(|h| h.contains("aws configure")));
    }
}
