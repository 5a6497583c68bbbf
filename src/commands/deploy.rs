use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::DeployConfig;
use crate::domain::{DeploymentTarget, PollOutcome};
use crate::error::DeployError;
use crate::infrastructure::{AmplifyCli, HttpUploader};
use crate::services::DeployService;
use crate::ui;

/// Deploy the build output to the Amplify branch named `environment`
///
/// Returns `Ok` for a successful deployment and for a poll timeout; the
/// job may still finish after the timeout, so only the banner differs.
pub async fn execute(environment: String, config_path: &Path) -> Result<()> {
    let config = DeployConfig::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    ui::print_header(&format!("Amplify Deploy - {}", environment));

    let target = DeploymentTarget::new(&config.app_name, environment, &config.region)
        .map_err(DeployError::from)?;

    info!("🎯 App: {}", target.app_name);
    info!("🌿 Branch: {}", target.branch);
    info!("🌍 Region: {}", target.region);
    info!("📁 Build output: {}", config.build_dir.display());
    println!();

    let api = AmplifyCli::new(&config.region);
    let uploader = HttpUploader::new().context("Failed to create HTTP client")?;
    let service = DeployService::new(api, uploader, config);

    let report = service.execute(&target).await?;

    println!();
    match report.outcome {
        PollOutcome::TimedOut { last_status } => {
            ui::print_warning(&format!(
                "Deployment job {} still {} when polling stopped",
                report.job_id, last_status
            ));
            println!(
                "   Follow it in the console: {}",
                report.target.console_url().bright_cyan()
            );
        }
        _ => {
            ui::print_success(&format!("Deployed {} to {}", target.branch, target.app_name));
            println!("🌐 Live at: {}", report.target.domain_url().bright_cyan().bold());
        }
    }

    let total: Duration = report.phases.iter().map(|p| p.duration).sum();
    info!("⏱️  Total time: {:.1}s", total.as_secs_f64());

    if report.stopped_jobs > 0 {
        info!("🛑 Stopped {} earlier job(s) on this branch", report.stopped_jobs);
    }

    Ok(())
}
