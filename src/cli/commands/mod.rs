//! Command execution coordinating a whole run.
//!
//! Argument validation, release configuration, preflight checks and the
//! upload destination are all settled before any build work begins.

mod build;
mod test_run;

use crate::cli::{Args, RuntimeConfig};
use crate::error::{ConfigError, ReleaseError, Result};
use crate::metadata::ProjectConfig;
use crate::preflight;
use crate::process::SystemRunner;
use crate::toolchain;

/// Execute a run and turn its failure into exit status 1
pub async fn execute_command(args: Args) -> Result<i32> {
    let config = RuntimeConfig::from(&args);

    match run(&args, &config).await {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            report_error(&config, &e);
            Ok(1)
        }
    }
}

/// Print an error followed by its recovery suggestions
pub fn report_error(config: &RuntimeConfig, error: &ReleaseError) {
    config.error_println(&error.to_string());
    let suggestions = error.recovery_suggestions();
    if !suggestions.is_empty() {
        config.println("\nRecovery suggestions:");
        for suggestion in suggestions {
            config.indent(&suggestion);
        }
    }
}

async fn run(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    args.validate()?;
    let args = &args.clone().with_absolute_source()?;
    let project = ProjectConfig::load(&args.source, args.config.as_deref())?;
    config.verbose_println(&format!("Loaded release configuration for '{}'", project.name()));

    preflight::report_environment(&args.source, config);
    preflight::check_prerequisites(&project.prerequisites, args.stages(), config)?;
    let bucket = upload_bucket(args, &project)?;

    let runner = SystemRunner::new(args.debug);
    if args.generate {
        config.println("Code generation requested; nothing to generate.");
    }
    if args.fetch_dependencies() {
        toolchain::fetch_dependencies(&runner, &args.source, config).await?;
    }

    if args.test {
        return test_run::execute(&runner, args, config).await;
    }
    build::execute(&runner, args, &project, bucket.as_deref(), config).await
}

/// Upload destination: `--bucket`, else the configured bucket.
///
/// `None` when not uploading.
fn upload_bucket(args: &Args, project: &ProjectConfig) -> Result<Option<String>> {
    if !args.upload || args.test {
        return Ok(None);
    }
    args.bucket
        .clone()
        .or_else(|| project.upload_bucket.clone())
        .filter(|bucket| !bucket.trim().is_empty())
        .map(Some)
        .ok_or_else(|| {
            ConfigError::MissingArgument {
                argument: "--bucket".to_string(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("release_matrix").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn test_bucket_from_cli_wins() {
        let project = ProjectConfig::from_toml("[upload]\nbucket = \"cfg/nightly\"\n", "ossia").unwrap();
        let bucket = upload_bucket(&args(&["--upload", "--bucket=cli"]), &project).unwrap();
        assert_eq!(bucket.as_deref(), Some("cli"));
        let bucket = upload_bucket(&args(&["--upload"]), &project).unwrap();
        assert_eq!(bucket.as_deref(), Some("cfg/nightly"));
    }

    #[test]
    fn test_upload_without_bucket_is_missing_argument() {
        let project = ProjectConfig::from_toml("", "ossia").unwrap();
        let err = upload_bucket(&args(&["--upload"]), &project).unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Config(ConfigError::MissingArgument { .. })
        ));
        assert_eq!(upload_bucket(&args(&[]), &project).unwrap(), None);
    }

    #[tokio::test]
    async fn test_conflicting_flags_exit_one() {
        let code = execute_command(args(&["--nightly", "--rc=1", "--version=1.0"]))
            .await
            .unwrap();
        assert_eq!(code, 1);
    }
}
