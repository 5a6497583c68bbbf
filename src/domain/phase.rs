//! Deployment phases
//!
//! A run is an explicit sequence of named phases. Each phase either
//! completes or stops the run; the recorded results drive the summary.

use std::time::Duration;

use super::job::PollOutcome;
use super::target::ResolvedTarget;

/// Phases of a deployment run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployPhase {
    /// Build output, aws CLI and service reachability checks
    Preflight,
    /// Look up or create the app and branch
    Resolve,
    /// Zip the build output
    Package,
    /// Stop jobs still pending or running on the branch
    Cleanup,
    /// Create the job, upload the archive, start the job
    Deploy,
    /// Wait for the job to finish
    Poll,
}

impl DeployPhase {
    pub const ALL: [DeployPhase; 6] = [
        Self::Preflight,
        Self::Resolve,
        Self::Package,
        Self::Cleanup,
        Self::Deploy,
        Self::Poll,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Preflight => "Preflight",
            Self::Resolve => "Resolve",
            Self::Package => "Package",
            Self::Cleanup => "Cleanup",
            Self::Deploy => "Deploy",
            Self::Poll => "Poll",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Preflight => "🔍",
            Self::Resolve => "📡",
            Self::Package => "📦",
            Self::Cleanup => "🛑",
            Self::Deploy => "🚀",
            Self::Poll => "⏳",
        }
    }

    /// 1-based position, for "Step n/6" headers
    pub fn position(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).map_or(0, |i| i + 1)
    }
}

/// Timing and result of one phase
#[derive(Debug, Clone)]
pub struct PhaseResult {
    pub phase: DeployPhase,
    pub success: bool,
    pub duration: Duration,
    pub message: Option<String>,
}

impl PhaseResult {
    pub fn success(phase: DeployPhase, duration: Duration) -> Self {
        Self {
            phase,
            success: true,
            duration,
            message: None,
        }
    }

    pub fn failure(phase: DeployPhase, duration: Duration, message: impl Into<String>) -> Self {
        Self {
            phase,
            success: false,
            duration,
            message: Some(message.into()),
        }
    }
}

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub target: ResolvedTarget,
    pub job_id: String,
    pub outcome: PollOutcome,
    pub stopped_jobs: usize,
    pub phases: Vec<PhaseResult>,
}
