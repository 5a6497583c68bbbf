//! AWS Amplify operations via the aws CLI
//!
//! Every call is `aws amplify <operation> ... --region <r> --output json`
//! and the JSON response is parsed with serde. The binary comes from
//! `AWS_BIN` or PATH; credentials are whatever the aws CLI itself reads.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io;
use tokio::process::Command;
use tracing::debug;

use crate::domain::{DeploymentTicket, JobStatus, JobSummary};
use crate::error::CliError;
use crate::tools::{get_tool_path, locate, tools};

/// An Amplify app as returned by list-apps / get-app / create-app
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub app_id: String,
    pub name: String,
    #[serde(default)]
    pub default_domain: Option<String>,
}

/// A branch of an Amplify app
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub branch_name: String,
    #[serde(default)]
    pub stage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListAppsResponse {
    #[serde(default)]
    apps: Vec<App>,
}

#[derive(Debug, Deserialize)]
struct AppResponse {
    app: App,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    branch: Branch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListJobsResponse {
    #[serde(default)]
    job_summaries: Vec<JobSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDeploymentResponse {
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default)]
    zip_upload_url: Option<String>,
}

impl CreateDeploymentResponse {
    fn into_ticket(self) -> Option<DeploymentTicket> {
        match (self.job_id, self.zip_upload_url) {
            (Some(job_id), Some(zip_upload_url)) if !job_id.is_empty() && !zip_upload_url.is_empty() => {
                Some(DeploymentTicket {
                    job_id,
                    zip_upload_url,
                })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetJobResponse {
    job: JobDetail,
}

#[derive(Debug, Deserialize)]
struct JobDetail {
    summary: JobSummary,
}

/// Operations the deploy service needs from the hosting platform
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Version banner of the CLI; fails if it cannot be executed
    async fn cli_version(&self) -> Result<String, CliError>;

    async fn list_apps(&self) -> Result<Vec<App>, CliError>;

    async fn create_app(&self, name: &str) -> Result<App, CliError>;

    async fn get_app(&self, app_id: &str) -> Result<App, CliError>;

    /// `Ok(None)` when the branch does not exist
    async fn get_branch(&self, app_id: &str, branch: &str) -> Result<Option<Branch>, CliError>;

    async fn create_branch(&self, app_id: &str, branch: &str) -> Result<Branch, CliError>;

    /// Most recent jobs on the branch, newest first
    async fn list_jobs(
        &self,
        app_id: &str,
        branch: &str,
        max_results: u32,
    ) -> Result<Vec<JobSummary>, CliError>;

    async fn stop_job(&self, app_id: &str, branch: &str, job_id: &str) -> Result<(), CliError>;

    /// `Ok(None)` when the response lacks the job ID or upload URL
    async fn create_deployment(
        &self,
        app_id: &str,
        branch: &str,
    ) -> Result<Option<DeploymentTicket>, CliError>;

    async fn start_deployment(&self, app_id: &str, branch: &str, job_id: &str)
        -> Result<(), CliError>;

    async fn get_job_status(
        &self,
        app_id: &str,
        branch: &str,
        job_id: &str,
    ) -> Result<JobStatus, CliError>;
}

/// `HostingApi` backed by the aws CLI
pub struct AmplifyCli {
    aws: String,
    region: String,
}

impl AmplifyCli {
    /// Client for `region`, using `AWS_BIN` or `aws` from PATH
    pub fn new(region: impl Into<String>) -> Self {
        Self::with_binary(get_tool_path(tools::AWS), region)
    }

    pub fn with_binary(aws: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            aws: aws.into(),
            region: region.into(),
        }
    }

    fn describe(operation: &[&str]) -> String {
        format!("aws amplify {}", operation.join(" "))
    }

    /// Run `aws amplify <args>` and return stdout
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, CliError> {
        debug!("Running {}", Self::describe(args));

        let output = Command::new(&self.aws)
            .arg("amplify")
            .args(args)
            .args(["--region", self.region.as_str(), "--output", "json"])
            .env("AWS_PAGER", "")
            .output()
            .await
            .map_err(|source| CliError::Spawn {
                tool: self.aws.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CliError::Failed {
                command: Self::describe(args),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    async fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T, CliError> {
        let stdout = self.run(args).await?;
        serde_json::from_slice(&stdout).map_err(|source| CliError::Parse {
            command: Self::describe(args),
            source,
        })
    }
}

#[async_trait]
impl HostingApi for AmplifyCli {
    async fn cli_version(&self) -> Result<String, CliError> {
        let binary = locate(&self.aws).ok_or_else(|| CliError::Spawn {
            tool: self.aws.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "executable not found"),
        })?;

        let output = Command::new(&binary)
            .arg("--version")
            .output()
            .await
            .map_err(|source| CliError::Spawn {
                tool: self.aws.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CliError::Failed {
                command: "aws --version".to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // aws v1 printed its version on stderr
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            Ok(String::from_utf8_lossy(&output.stderr).trim().to_string())
        } else {
            Ok(stdout)
        }
    }

    async fn list_apps(&self) -> Result<Vec<App>, CliError> {
        let response: ListAppsResponse = self.run_json(&["list-apps"]).await?;
        Ok(response.apps)
    }

    async fn create_app(&self, name: &str) -> Result<App, CliError> {
        let response: AppResponse = self.run_json(&["create-app", "--name", name]).await?;
        Ok(response.app)
    }

    async fn get_app(&self, app_id: &str) -> Result<App, CliError> {
        let response: AppResponse = self.run_json(&["get-app", "--app-id", app_id]).await?;
        Ok(response.app)
    }

    async fn get_branch(&self, app_id: &str, branch: &str) -> Result<Option<Branch>, CliError> {
        match self
            .run_json::<BranchResponse>(&["get-branch", "--app-id", app_id, "--branch-name", branch])
            .await
        {
            Ok(response) => Ok(Some(response.branch)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_branch(&self, app_id: &str, branch: &str) -> Result<Branch, CliError> {
        let response: BranchResponse = self
            .run_json(&["create-branch", "--app-id", app_id, "--branch-name", branch])
            .await?;
        Ok(response.branch)
    }

    async fn list_jobs(
        &self,
        app_id: &str,
        branch: &str,
        max_results: u32,
    ) -> Result<Vec<JobSummary>, CliError> {
        let max_results = max_results.to_string();
        let response: ListJobsResponse = self
            .run_json(&[
                "list-jobs",
                "--app-id",
                app_id,
                "--branch-name",
                branch,
                "--max-results",
                max_results.as_str(),
            ])
            .await?;
        Ok(response.job_summaries)
    }

    async fn stop_job(&self, app_id: &str, branch: &str, job_id: &str) -> Result<(), CliError> {
        self.run(&[
            "stop-job",
            "--app-id",
            app_id,
            "--branch-name",
            branch,
            "--job-id",
            job_id,
        ])
        .await?;
        Ok(())
    }

    async fn create_deployment(
        &self,
        app_id: &str,
        branch: &str,
    ) -> Result<Option<DeploymentTicket>, CliError> {
        let response: CreateDeploymentResponse = self
            .run_json(&["create-deployment", "--app-id", app_id, "--branch-name", branch])
            .await?;
        Ok(response.into_ticket())
    }

    async fn start_deployment(
        &self,
        app_id: &str,
        branch: &str,
        job_id: &str,
    ) -> Result<(), CliError> {
        self.run(&[
            "start-deployment",
            "--app-id",
            app_id,
            "--branch-name",
            branch,
            "--job-id",
            job_id,
        ])
        .await?;
        Ok(())
    }

    async fn get_job_status(
        &self,
        app_id: &str,
        branch: &str,
        job_id: &str,
    ) -> Result<JobStatus, CliError> {
        let response: GetJobResponse = self
            .run_json(&[
                "get-job",
                "--app-id",
                app_id,
                "--branch-name",
                branch,
                "--job-id",
                job_id,
            ])
            .await?;
        Ok(response.job.summary.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_apps_response() {
        let json = r#"{"apps":[
            {"appId":"d1","name":"aplii-landing","defaultDomain":"d1.amplifyapp.com","platform":"WEB"},
            {"appId":"d2","name":"other"}
        ]}"#;
        let response: ListAppsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.apps.len(), 2);
        assert_eq!(response.apps[0].app_id, "d1");
        assert_eq!(response.apps[1].default_domain, None);
    }

    #[test]
    fn test_create_deployment_ticket() {
        let full: CreateDeploymentResponse = serde_json::from_str(
            r#"{"jobId":"12","fileUploadUrls":{},"zipUploadUrl":"https://upload.example/zip"}"#,
        )
        .unwrap();
        assert_eq!(
            full.into_ticket(),
            Some(DeploymentTicket {
                job_id: "12".to_string(),
                zip_upload_url: "https://upload.example/zip".to_string(),
            })
        );

        let partial: CreateDeploymentResponse =
            serde_json::from_str(r#"{"zipUploadUrl":"https://upload.example/zip"}"#).unwrap();
        assert_eq!(partial.into_ticket(), None);
    }

    #[test]
    fn test_get_job_response() {
        let json = r#"{"job":{"summary":{"jobId":"3","status":"RUNNING","jobType":"MANUAL"},"steps":[]}}"#;
        let response: GetJobResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.job.summary.status, JobStatus::Running);
    }

    #[test]
    fn test_list_jobs_response_without_summaries() {
        let response: ListJobsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.job_summaries.is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let cli = AmplifyCli::with_binary("/nonexistent/aws-cli-4b1d", "us-east-1");
        assert!(matches!(
            cli.cli_version().await.unwrap_err(),
            CliError::Spawn { .. }
        ));
        assert!(matches!(
            cli.list_apps().await.unwrap_err(),
            CliError::Spawn { .. }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_cli_with_region_and_maps_not_found() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let script = dir.path().join("aws");
        std::fs::write(
            &script,
            format!(
                r#"#!/bin/sh
echo "$@" >> "{log}"
case "$2" in
  list-apps) echo '{{"apps":[{{"appId":"d1","name":"aplii-landing"}}]}}' ;;
  get-branch) echo "An error occurred (NotFoundException) when calling the GetBranch operation" >&2; exit 254 ;;
  *) echo '{{}}' ;;
esac
"#,
                log = log.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let cli = AmplifyCli::with_binary(script.to_string_lossy(), "eu-west-1");

        let apps = cli.list_apps().await.unwrap();
        assert_eq!(apps[0].name, "aplii-landing");

        assert_eq!(cli.get_branch("d1", "dev").await.unwrap(), None);

        let calls = std::fs::read_to_string(&log).unwrap();
        assert!(calls.contains("amplify list-apps --region eu-west-1 --output json"));
        assert!(calls.contains("get-branch --app-id d1 --branch-name dev"));
    }
}
