//! Deploy service - orchestrates a deployment run
//!
//! Phases run in order and the first failing phase stops the run:
//! preflight, resolve, package, cleanup, deploy, poll. Only the
//! cleanup phase is best-effort. The archive is removed when the run
//! ends, whichever way it ends.

use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::DeployConfig;
use crate::domain::{
    DeployPhase, DeployReport, DeploymentTarget, JobStatus, PhaseResult, PollOutcome,
    ResolvedTarget,
};
use crate::error::{DeployError, JobError, PackageError, PreconditionError, ResolutionError};
use crate::infrastructure::{package_directory, ArchiveArtifact, ArtifactUploader, HostingApi};
use crate::ui;

/// Service for running deployments against a hosting platform
pub struct DeployService<A, U> {
    api: A,
    uploader: U,
    config: DeployConfig,
}

impl<A: HostingApi, U: ArtifactUploader> DeployService<A, U> {
    pub fn new(api: A, uploader: U, config: DeployConfig) -> Self {
        Self {
            api,
            uploader,
            config,
        }
    }

    /// Run every phase for `target` and print the phase summary
    pub async fn execute(&self, target: &DeploymentTarget) -> Result<DeployReport, DeployError> {
        let mut phases = Vec::new();
        let result = self.run_phases(target, &mut phases).await;
        ui::print_phase_summary(&phases);

        result.map(|mut report| {
            report.phases = phases;
            report
        })
    }

    async fn run_phases(
        &self,
        target: &DeploymentTarget,
        phases: &mut Vec<PhaseResult>,
    ) -> Result<DeployReport, DeployError> {
        timed(phases, DeployPhase::Preflight, self.preflight()).await?;
        let resolved = timed(phases, DeployPhase::Resolve, self.resolve(target)).await?;

        let result = self.deploy_resolved(target, &resolved, phases).await;
        if result.is_err() {
            info!("💡 The Amplify console accepts manual uploads as a fallback");
            info!("🔗 {}", resolved.console_url());
        }
        result
    }

    async fn deploy_resolved(
        &self,
        target: &DeploymentTarget,
        resolved: &ResolvedTarget,
        phases: &mut Vec<PhaseResult>,
    ) -> Result<DeployReport, DeployError> {
        let archive = timed(phases, DeployPhase::Package, self.package(target)).await?;
        let archive = scopeguard::guard(archive, |archive| {
            archive.remove();
        });

        let stopped_jobs = timed(phases, DeployPhase::Cleanup, async {
            Ok::<_, DeployError>(self.stop_active_jobs(resolved).await)
        })
        .await?;

        let job_id = timed(phases, DeployPhase::Deploy, self.deploy(resolved, &archive)).await?;

        let outcome = timed(phases, DeployPhase::Poll, async {
            let outcome = self.await_completion(resolved, &job_id).await?;
            self.judge(&job_id, outcome)
        })
        .await?;

        Ok(DeployReport {
            target: resolved.clone(),
            job_id,
            outcome,
            stopped_jobs,
            phases: Vec::new(),
        })
    }

    /// Nothing is mutated here: build output, CLI, service reachability
    async fn preflight(&self) -> Result<(), PreconditionError> {
        let build_dir = &self.config.build_dir;
        if !build_dir.is_dir() {
            return Err(PreconditionError::BuildDirMissing {
                path: build_dir.clone(),
            });
        }
        info!("📦 Build files found in {}", build_dir.display());

        let version = self
            .api
            .cli_version()
            .await
            .map_err(|source| PreconditionError::CliUnavailable { source })?;
        info!("✅ AWS CLI is available ({})", version);

        self.api
            .list_apps()
            .await
            .map_err(|source| PreconditionError::ServiceUnreachable {
                region: self.config.region.clone(),
                source,
            })?;
        info!("✅ AWS Amplify service is available in {}", self.config.region);

        Ok(())
    }

    /// Look up the app and branch, creating whichever is missing
    async fn resolve(&self, target: &DeploymentTarget) -> Result<ResolvedTarget, ResolutionError> {
        info!(
            "📡 Looking for Amplify app: {} (branch: {}) in region: {}",
            target.app_name, target.branch, target.region
        );

        let apps = self
            .api
            .list_apps()
            .await
            .map_err(ResolutionError::ListApps)?;

        let app_id = match apps.iter().find(|app| app.name == target.app_name) {
            Some(app) => {
                info!("✅ Found app ID: {}", app.app_id);
                app.app_id.clone()
            }
            None => {
                warn!("⚠️  App '{}' not found. Available apps:", target.app_name);
                for app in &apps {
                    info!("   - {} ({})", app.name, app.app_id);
                }
                info!("🔧 Creating new Amplify app: {}", target.app_name);
                let app = self.api.create_app(&target.app_name).await.map_err(|source| {
                    ResolutionError::CreateApp {
                        name: target.app_name.clone(),
                        source,
                    }
                })?;
                info!("✅ Created new app with ID: {}", app.app_id);
                app.app_id
            }
        };

        let existing = self
            .api
            .get_branch(&app_id, &target.branch)
            .await
            .map_err(|source| ResolutionError::GetBranch {
                branch: target.branch.clone(),
                source,
            })?;

        if let Some(branch) = existing {
            match branch.stage {
                Some(stage) => info!("✅ Branch '{}' exists ({})", branch.branch_name, stage),
                None => info!("✅ Branch '{}' exists", branch.branch_name),
            }
        } else {
            info!("🌿 Branch '{}' not found, creating it...", target.branch);
            self.api
                .create_branch(&app_id, &target.branch)
                .await
                .map_err(|source| ResolutionError::CreateBranch {
                    branch: target.branch.clone(),
                    source,
                })?;
            info!("✅ Created branch '{}'", target.branch);
        }

        let app = self
            .api
            .get_app(&app_id)
            .await
            .map_err(|source| ResolutionError::GetApp {
                app_id: app_id.clone(),
                source,
            })?;

        let resolved = ResolvedTarget {
            app_id,
            app_name: app.name,
            branch: target.branch.clone(),
            region: target.region.clone(),
        };
        info!("📋 App details: {}", resolved.app_name);
        if let Some(default_domain) = &app.default_domain {
            debug!("Default domain: {}", default_domain);
        }
        info!("🌐 {} domain: {}", resolved.branch, resolved.domain_url());

        Ok(resolved)
    }

    async fn package(&self, target: &DeploymentTarget) -> Result<ArchiveArtifact, PackageError> {
        info!("📦 Creating deployment package...");

        let build_dir = self.config.build_dir.clone();
        let archive_dir = self.config.archive_dir.clone();
        let prefix = self.config.archive_prefix.clone();
        let stem = target.archive_stem();

        let artifact = tokio::task::spawn_blocking(move || {
            package_directory(&build_dir, &archive_dir, &prefix, &stem)
        })
        .await
        .map_err(|e| PackageError::Io(io::Error::new(io::ErrorKind::Other, e)))??;

        info!(
            "✅ Created deployment package: {} ({} files)",
            artifact.file_name(),
            artifact.files()
        );
        Ok(artifact)
    }

    /// Stop PENDING/RUNNING jobs on the branch. Best-effort: failures are
    /// logged and the run continues. Returns how many stops succeeded.
    async fn stop_active_jobs(&self, resolved: &ResolvedTarget) -> usize {
        info!("🔍 Checking for running deployments...");

        let jobs = match self
            .api
            .list_jobs(&resolved.app_id, &resolved.branch, self.config.max_jobs)
            .await
        {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!("⚠️  Could not check running jobs: {}", e);
                return 0;
            }
        };

        let active: Vec<_> = jobs.into_iter().filter(|job| job.status.is_active()).collect();
        if active.is_empty() {
            info!("✅ No running jobs found");
            return 0;
        }

        warn!("⚠️  Found {} running job(s). Stopping them...", active.len());
        let mut stopped = 0;
        for job in &active {
            info!(
                "🛑 Stopping job: {} ({}, {})",
                job.job_id,
                job.status,
                job.job_type.as_deref().unwrap_or("unknown type")
            );
            match self
                .api
                .stop_job(&resolved.app_id, &resolved.branch, &job.job_id)
                .await
            {
                Ok(()) => {
                    info!("✅ Stopped job: {}", job.job_id);
                    stopped += 1;
                }
                Err(e) => warn!("⚠️  Could not stop job {}: {}", job.job_id, e),
            }
        }

        if stopped > 0 {
            info!("⏳ Waiting for jobs to stop...");
            tokio::time::sleep(self.config.stop_settle_delay).await;
        }

        stopped
    }

    /// Create the job, upload the archive, start the job
    async fn deploy(
        &self,
        resolved: &ResolvedTarget,
        archive: &ArchiveArtifact,
    ) -> Result<String, JobError> {
        info!("🚀 Creating manual deployment...");
        let ticket = self
            .api
            .create_deployment(&resolved.app_id, &resolved.branch)
            .await
            .map_err(JobError::CreateDeployment)?
            .ok_or(JobError::MissingTicket)?;
        info!("✅ Created job ID: {}", ticket.job_id);

        info!("⬆️  Uploading deployment package...");
        self.uploader
            .upload(&ticket.zip_upload_url, archive.path())
            .await?;
        info!("✅ Upload completed");

        info!("🚀 Starting Amplify deployment...");
        self.api
            .start_deployment(&resolved.app_id, &resolved.branch, &ticket.job_id)
            .await
            .map_err(|source| JobError::Start {
                job_id: ticket.job_id.clone(),
                source,
            })?;

        Ok(ticket.job_id)
    }

    async fn await_completion(
        &self,
        resolved: &ResolvedTarget,
        job_id: &str,
    ) -> Result<PollOutcome, JobError> {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("Waiting for deployment to complete");
        spinner.enable_steady_tick(Duration::from_millis(100));

        let result = self.poll_until_done(resolved, job_id, &spinner).await;
        spinner.finish_and_clear();

        match &result {
            Ok(PollOutcome::TimedOut { last_status }) => {
                info!("📈 Deployment status: {}", last_status);
                warn!("⚠️  Deployment timed out, but may still be running. Check the console for updates.");
            }
            Ok(PollOutcome::Succeeded) => info!("📈 Deployment status: {}", JobStatus::Succeeded),
            Ok(PollOutcome::Failed(status)) => info!("📈 Deployment status: {}", status),
            Err(_) => {}
        }
        result
    }

    /// One status read per interval until a terminal status or the deadline.
    /// There is always at least one read.
    async fn poll_until_done(
        &self,
        resolved: &ResolvedTarget,
        job_id: &str,
        spinner: &ProgressBar,
    ) -> Result<PollOutcome, JobError> {
        let deadline = tokio::time::Instant::now() + self.config.timeout;

        loop {
            let status = self
                .api
                .get_job_status(&resolved.app_id, &resolved.branch, job_id)
                .await
                .map_err(|source| JobError::Poll {
                    job_id: job_id.to_string(),
                    source,
                })?;
            spinner.set_message(format!("Waiting for deployment to complete ({})", status));

            if let Some(outcome) = PollOutcome::from_status(status) {
                return Ok(outcome);
            }

            tokio::time::sleep(self.config.poll_interval).await;
            if tokio::time::Instant::now() >= deadline {
                return Ok(PollOutcome::TimedOut {
                    last_status: status,
                });
            }
        }
    }

    /// Terminal failures become errors; a timeout only with `fail_on_timeout`
    fn judge(&self, job_id: &str, outcome: PollOutcome) -> Result<PollOutcome, JobError> {
        match outcome {
            PollOutcome::Failed(status) => Err(JobError::Terminal {
                job_id: job_id.to_string(),
                status,
            }),
            PollOutcome::TimedOut { last_status } if self.config.fail_on_timeout => {
                Err(JobError::TimedOut {
                    job_id: job_id.to_string(),
                    timeout_secs: self.config.timeout.as_secs(),
                    last_status,
                })
            }
            other => Ok(other),
        }
    }
}

/// Run one phase, printing its header and recording its timing
async fn timed<T, E, F>(
    phases: &mut Vec<PhaseResult>,
    phase: DeployPhase,
    work: F,
) -> Result<T, DeployError>
where
    E: Into<DeployError>,
    F: Future<Output = Result<T, E>>,
{
    ui::print_phase(phase);
    let start = Instant::now();

    match work.await {
        Ok(value) => {
            let duration = start.elapsed();
            info!("✅ {} completed in {:.1}s", phase.name(), duration.as_secs_f64());
            phases.push(PhaseResult::success(phase, duration));
            Ok(value)
        }
        Err(e) => {
            let err = e.into();
            let duration = start.elapsed();
            warn!("❌ {} failed: {}", phase.name(), err);
            phases.push(PhaseResult::failure(phase, duration, err.to_string()));
            Err(err)
        }
    }
}
