//! Runtime tool path resolution
//!
//! For each external tool we check `{TOOL}_BIN` (e.g. `AWS_BIN`) first and
//! fall back to the bare name, which is looked up on PATH. Tests and Nix
//! wrappers point the envvar at an explicit binary.

use std::env;
use std::path::PathBuf;

/// Tools this crate shells out to
pub mod tools {
    pub const AWS: &str = "aws";
}

/// `{TOOL}_BIN` if set and non-empty, else the tool name itself
pub fn get_tool_path(tool: &str) -> String {
    let env_var = format!("{}_BIN", tool.to_uppercase());
    env::var(&env_var)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| tool.to_string())
}

/// Absolute path of an executable, if it can be found
pub fn locate(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_tool_path_from_env() {
        env::set_var("DEPLOY_TEST_TOOL_BIN", "/opt/bin/deploy-test-tool");
        assert_eq!(get_tool_path("deploy_test_tool"), "/opt/bin/deploy-test-tool");
        env::remove_var("DEPLOY_TEST_TOOL_BIN");
    }

    #[test]
    fn test_get_tool_path_fallback() {
        env::remove_var("ABSENT_TOOL_BIN");
        assert_eq!(get_tool_path("absent_tool"), "absent_tool");
    }

    #[test]
    fn test_locate_missing_program() {
        assert!(locate("definitely-not-a-real-binary-4b1d").is_none());
    }
}
