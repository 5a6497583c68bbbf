//! Deployment target: which app, branch and region a run deploys to

use crate::error::PreconditionError;

/// Longest branch name Amplify accepts
const MAX_BRANCH_LEN: usize = 255;

/// Immutable for the whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    pub app_name: String,
    pub branch: String,
    pub region: String,
}

impl DeploymentTarget {
    /// Build a target, rejecting branch names the CLI or the archive name can't carry
    pub fn new(
        app_name: impl Into<String>,
        branch: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self, PreconditionError> {
        let branch = branch.into();
        validate_branch(&branch)?;
        Ok(Self {
            app_name: app_name.into(),
            branch,
            region: region.into(),
        })
    }

    /// Branch name made safe for use inside a file name
    pub fn archive_stem(&self) -> String {
        self.branch.replace(['/', '\\'], "-")
    }
}

fn validate_branch(branch: &str) -> Result<(), PreconditionError> {
    let invalid = |reason: &str| PreconditionError::InvalidBranch {
        name: branch.to_string(),
        reason: reason.to_string(),
    };

    if branch.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    if branch.len() > MAX_BRANCH_LEN {
        return Err(invalid("must be at most 255 characters"));
    }
    if branch.starts_with('-') {
        return Err(invalid("must not start with '-'"));
    }
    if branch.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("must not contain whitespace or control characters"));
    }
    Ok(())
}

/// Target after app and branch have been looked up or created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub app_id: String,
    pub app_name: String,
    pub branch: String,
    pub region: String,
}

impl ResolvedTarget {
    /// Public URL the branch is served from
    pub fn domain_url(&self) -> String {
        format!("https://{}.{}.amplifyapp.com", self.branch, self.app_id)
    }

    /// Amplify console page for the app
    pub fn console_url(&self) -> String {
        format!(
            "https://console.aws.amazon.com/amplify/home?region={}#/{}",
            self.region, self.app_id
        )
    }
}
