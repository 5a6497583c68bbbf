//! CLI definitions for amplify-deploy

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "amplify-deploy",
    version,
    about = "Deploy the static site build to an AWS Amplify branch",
    long_about = "Packages the build output, stops in-flight jobs on the branch,\nuploads the archive as a manual deployment and waits for it to finish."
)]
pub struct Cli {
    /// Environment to deploy; used as the Amplify branch name (e.g. dev, prod)
    pub environment: String,

    /// Deployment settings file; missing file means defaults
    #[arg(long, env = "DEPLOY_CONFIG", default_value = "deploy.yaml")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_environment_is_required() {
        let err = Cli::try_parse_from(["amplify-deploy"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_parse_environment_and_flags() {
        let cli =
            Cli::try_parse_from(["amplify-deploy", "prod", "-v", "--config", "ci/deploy.yaml"])
                .unwrap();
        assert_eq!(cli.environment, "prod");
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("ci/deploy.yaml"));
    }
}
