//! Domain layer - pure deployment types
//!
//! No external I/O here; everything can be unit tested directly.

pub mod job;
pub mod phase;
pub mod target;

pub use job::{DeploymentTicket, JobStatus, JobSummary, PollOutcome};
pub use phase::{DeployPhase, DeployReport, PhaseResult};
pub use target::{DeploymentTarget, ResolvedTarget};
