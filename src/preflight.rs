//! Environment report and prerequisite tool checks.
//!
//! Runs before any version resolution or build work so that a missing tool
//! fails the run while nothing has been written yet.

use crate::cli::RuntimeConfig;
use crate::error::{ConfigError, Result};
use crate::metadata::Prerequisites;
use std::path::{Path, PathBuf};

const TOOLCHAIN_VARS: [&str; 3] = ["GOPATH", "GOBIN", "GOROOT"];

/// Which optional stages of the run will execute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stages {
    /// Packages will be built (`fpm` required)
    pub package: bool,
    /// Packages will be uploaded (`aws` required)
    pub upload: bool,
}

/// Print the toolchain environment and warn when `working_dir` is outside
/// every `GOPATH` entry.
pub fn report_environment(working_dir: &Path, config: &RuntimeConfig) {
    config.section("Checking environment");
    for var in TOOLCHAIN_VARS {
        let value = std::env::var(var).unwrap_or_default();
        config.indent(&format!("{} -> {}", var, value));
    }

    if let Some(gopath) = std::env::var_os("GOPATH")
        && !gopath.is_empty()
        && !under_gopath(working_dir, &gopath)
    {
        config.warning_println(
            "Your current directory is not under your GOPATH. This may lead to build failures.",
        );
    }
}

fn under_gopath(dir: &Path, gopath: &std::ffi::OsStr) -> bool {
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    std::env::split_paths(gopath).any(|entry| {
        let entry = entry.canonicalize().unwrap_or(entry);
        dir.starts_with(entry)
    })
}

/// Check prerequisites on the host `PATH`.
pub fn check_prerequisites(prerequisites: &Prerequisites, stages: Stages, config: &RuntimeConfig) -> Result<()> {
    check_with(prerequisites, stages, config, |tool| which::which(tool).ok())
}

/// Report every declared tool, then fail on the first one the run needs but
/// `lookup` cannot find.
pub fn check_with<F>(prerequisites: &Prerequisites, stages: Stages, config: &RuntimeConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    config.section("Checking for dependencies");
    let describe = |found: &Option<PathBuf>| match found {
        Some(path) => path.display().to_string(),
        None => "?".to_string(),
    };

    let mut missing: Option<(String, String)> = None;
    for tool in &prerequisites.required {
        let found = lookup(tool);
        config.indent(&format!("{} -> {}", tool, describe(&found)));
        if found.is_none() && missing.is_none() {
            missing = Some((tool.clone(), "declared as a required prerequisite".to_string()));
        }
    }
    for tool in &prerequisites.optional {
        let found = lookup(tool);
        config.indent(&format!("{} (optional) -> {}", tool, describe(&found)));
    }
    if let Some((tool, purpose)) = missing {
        return Err(ConfigError::MissingTool { tool, purpose }.into());
    }

    for (needed, tool, purpose) in [
        (stages.package, "fpm", "needed by --package"),
        (stages.upload, "aws", "needed by --upload"),
    ] {
        if needed && lookup(tool).is_none() {
            return Err(ConfigError::MissingTool {
                tool: tool.to_string(),
                purpose: purpose.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;

    fn prereqs() -> Prerequisites {
        Prerequisites {
            required: vec!["git".to_string(), "go".to_string()],
            optional: vec!["fpm".to_string(), "rpmbuild".to_string()],
        }
    }

    fn only(tools: &'static [&'static str]) -> impl Fn(&str) -> Option<PathBuf> {
        move |tool| tools.contains(&tool).then(|| PathBuf::from("/usr/bin").join(tool))
    }

    fn missing_tool(err: ReleaseError) -> String {
        match err {
            ReleaseError::Config(ConfigError::MissingTool { tool, .. }) => tool,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_optional_tools_may_be_missing() {
        let config = RuntimeConfig::new(false);
        check_with(&prereqs(), Stages::default(), &config, only(&["git", "go"])).unwrap();
    }

    #[test]
    fn test_missing_required_tool() {
        let config = RuntimeConfig::new(false);
        let err = check_with(&prereqs(), Stages::default(), &config, only(&["git"])).unwrap_err();
        assert_eq!(missing_tool(err), "go");
    }

    #[test]
    fn test_package_needs_fpm() {
        let config = RuntimeConfig::new(false);
        let stages = Stages {
            package: true,
            upload: false,
        };
        let err = check_with(&prereqs(), stages, &config, only(&["git", "go"])).unwrap_err();
        assert_eq!(missing_tool(err), "fpm");
        check_with(&prereqs(), stages, &config, only(&["git", "go", "fpm"])).unwrap();
    }

    #[test]
    fn test_upload_needs_aws() {
        let config = RuntimeConfig::new(false);
        let stages = Stages {
            package: true,
            upload: true,
        };
        let err = check_with(&prereqs(), stages, &config, only(&["git", "go", "fpm"])).unwrap_err();
        assert_eq!(missing_tool(err), "aws");
    }

    #[test]
    fn test_under_gopath() {
        let gopath = tempfile::tempdir().unwrap();
        let inside = gopath.path().join("src/github.com/acme/ossia");
        std::fs::create_dir_all(&inside).unwrap();
        let elsewhere = tempfile::tempdir().unwrap();

        let joined = std::env::join_paths([PathBuf::from("/nonexistent"), gopath.path().to_path_buf()]).unwrap();
        assert!(under_gopath(&inside, &joined));
        assert!(!under_gopath(elsewhere.path(), &joined));
    }
}
