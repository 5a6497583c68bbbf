//! # Deployment Configuration
//!
//! Layered: built-in defaults → optional `deploy.yaml` → environment.
//!
//! ```yaml
//! app_name: aplii-landing
//! build_dir: dist
//! region: us-east-1
//! poll_interval: 5s
//! timeout: 15m
//! ```
//!
//! Every key is optional. Durations use humantime syntax (`3s`, `15m`).
//! `AWS_DEFAULT_REGION` wins over the file's `region`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_APP_NAME: &str = "aplii-landing";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const REGION_ENV: &str = "AWS_DEFAULT_REGION";

/// Upper bound Amplify accepts for `list-jobs --max-results`
const MAX_JOBS_LIMIT: u32 = 100;

/// Shape of `deploy.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    app_name: Option<String>,
    build_dir: Option<PathBuf>,
    archive_dir: Option<PathBuf>,
    archive_prefix: Option<String>,
    region: Option<String>,
    max_jobs: Option<u32>,
    poll_interval: Option<String>,
    timeout: Option<String>,
    stop_settle_delay: Option<String>,
    fail_on_timeout: Option<bool>,
}

/// Resolved settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct DeployConfig {
    /// Hosting app, shared by all environments
    pub app_name: String,
    /// Build output to package
    pub build_dir: PathBuf,
    /// Where the archive is written
    pub archive_dir: PathBuf,
    pub archive_prefix: String,
    pub region: String,
    /// How many recent jobs to inspect before deploying
    pub max_jobs: u32,
    pub poll_interval: Duration,
    pub timeout: Duration,
    /// Pause after stopping jobs so the stop takes effect
    pub stop_settle_delay: Duration,
    /// Treat a poll timeout as a failure instead of an inconclusive success
    pub fail_on_timeout: bool,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            build_dir: PathBuf::from("dist"),
            archive_dir: PathBuf::from("."),
            archive_prefix: DEFAULT_APP_NAME.to_string(),
            region: DEFAULT_REGION.to_string(),
            max_jobs: 5,
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(15 * 60),
            stop_settle_delay: Duration::from_secs(3),
            fail_on_timeout: false,
        }
    }
}

impl DeployConfig {
    /// Load from `path` (if it exists) and the process environment
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Self::parse_file(path, &content)?
        } else {
            FileConfig::default()
        };

        let region_override = std::env::var(REGION_ENV).ok().filter(|r| !r.trim().is_empty());
        Self::from_layers(file, region_override)
    }

    /// `path` only labels errors
    fn parse_file(path: &Path, content: &str) -> Result<FileConfig, ConfigError> {
        // An empty file deserializes to unit, not a map
        if content.trim().is_empty() {
            return Ok(FileConfig::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn from_layers(file: FileConfig, region_override: Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let app_name = file.app_name.unwrap_or(defaults.app_name);
        let archive_prefix = file.archive_prefix.unwrap_or_else(|| app_name.clone());

        let max_jobs = file.max_jobs.unwrap_or(defaults.max_jobs);
        if max_jobs == 0 || max_jobs > MAX_JOBS_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "max_jobs".to_string(),
                value: max_jobs.to_string(),
            });
        }

        let poll_interval = parse_duration_field("poll_interval", file.poll_interval)?
            .unwrap_or(defaults.poll_interval);
        if poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval".to_string(),
                value: "0s".to_string(),
            });
        }

        let config = Self {
            app_name,
            build_dir: file.build_dir.unwrap_or(defaults.build_dir),
            archive_dir: file.archive_dir.unwrap_or(defaults.archive_dir),
            archive_prefix,
            region: region_override
                .or(file.region)
                .unwrap_or(defaults.region),
            max_jobs,
            poll_interval,
            timeout: parse_duration_field("timeout", file.timeout)?.unwrap_or(defaults.timeout),
            stop_settle_delay: parse_duration_field("stop_settle_delay", file.stop_settle_delay)?
                .unwrap_or(defaults.stop_settle_delay),
            fail_on_timeout: file.fail_on_timeout.unwrap_or(defaults.fail_on_timeout),
        };

        if config.app_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "app_name".to_string(),
                value: config.app_name,
            });
        }

        Ok(config)
    }
}

fn parse_duration_field(field: &str, raw: Option<String>) -> Result<Option<Duration>, ConfigError> {
    raw.map(|value| {
        humantime::parse_duration(value.trim()).map_err(|_| ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(content: &str) -> Result<DeployConfig, ConfigError> {
        let file = DeployConfig::parse_file(Path::new("deploy.yaml"), content)?;
        DeployConfig::from_layers(file, None)
    }

    #[test]
    fn test_defaults() {
        let config = yaml("").unwrap();
        assert_eq!(config, DeployConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(900));
        assert_eq!(config.archive_prefix, "aplii-landing");
    }

    #[test]
    fn test_file_overrides() {
        let config = yaml(
            "app_name: my-site\nbuild_dir: out\nregion: eu-west-1\npoll_interval: 2s\ntimeout: 1m\nfail_on_timeout: true\n",
        )
        .unwrap();
        assert_eq!(config.app_name, "my-site");
        assert_eq!(config.archive_prefix, "my-site");
        assert_eq!(config.build_dir, PathBuf::from("out"));
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.fail_on_timeout);
    }

    #[test]
    fn test_region_env_wins() {
        let file = FileConfig {
            region: Some("eu-west-1".to_string()),
            ..FileConfig::default()
        };
        let config = DeployConfig::from_layers(file, Some("ap-south-1".to_string())).unwrap();
        assert_eq!(config.region, "ap-south-1");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            yaml("poll_interval: soon").unwrap_err(),
            ConfigError::InvalidValue { field, .. } if field == "poll_interval"
        ));
        assert!(matches!(
            yaml("poll_interval: 0s").unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
        assert!(matches!(
            yaml("max_jobs: 0").unwrap_err(),
            ConfigError::InvalidValue { field, .. } if field == "max_jobs"
        ));
        assert!(matches!(
            yaml("unknown_key: 1").unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeployConfig::load(&dir.path().join("deploy.yaml")).unwrap();
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
    }
}
