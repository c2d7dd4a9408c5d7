//! Per-job cross compilation.

use super::LdflagsSyntax;
use crate::bundler::ErrorExt;
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::git::BuildInfo;
use crate::matrix::BuildJob;
use crate::process::{CommandRunner, FailurePolicy, ToolCommand, run_tool};
use crate::version::Version;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const GOARM_VERSIONS: &[&str] = &["5", "6", "7", "arm64"];

/// Whether `version` is an ARM sub-version the toolchain understands
pub fn goarm_supported(version: &str) -> bool {
    GOARM_VERSIONS.contains(&version)
}

/// Options shared by every job of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Build with the race detector
    pub race: bool,
    /// `GOARM` value for arm jobs
    pub goarm: String,
    /// Remove an existing output directory first
    pub clean: bool,
    /// What a failing compiler does to the run
    pub policy: FailurePolicy,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            race: false,
            goarm: "6".to_string(),
            clean: false,
            policy: FailurePolicy::Fatal,
        }
    }
}

/// Compiles every declared target for one build job at a time.
pub struct Compiler<'a, R> {
    runner: &'a R,
    source_dir: PathBuf,
    targets: &'a BTreeMap<String, String>,
    syntax: LdflagsSyntax,
    options: CompileOptions,
}

impl<'a, R: CommandRunner> Compiler<'a, R> {
    /// Create a compiler for the targets of one source tree
    pub fn new(
        runner: &'a R,
        source_dir: impl Into<PathBuf>,
        targets: &'a BTreeMap<String, String>,
        syntax: LdflagsSyntax,
        options: CompileOptions,
    ) -> Self {
        Self {
            runner,
            source_dir: source_dir.into(),
            targets,
            syntax,
            options,
        }
    }

    /// Build every target for `job`
    pub async fn build(
        &self,
        job: &BuildJob,
        version: &Version,
        info: &BuildInfo,
        build_time: DateTime<Utc>,
        config: &RuntimeConfig,
    ) -> Result<()> {
        self.print_plan(job, version, info, config);
        self.prepare_output_dir(&job.output_dir, config).await?;

        config.println("Starting build...");
        for (name, entry) in self.targets {
            let output = job.output_dir.join(job.binary_name(name));
            config.println(&format!("Building '{}'...", output.display()));
            let command = self.command(job, entry, &output, version, info, build_time, config);
            run_tool(self.runner, &command, self.options.policy).await?;
        }
        Ok(())
    }

    /// Assemble the compiler invocation for one target
    #[allow(clippy::too_many_arguments)]
    fn command(
        &self,
        job: &BuildJob,
        entry: &str,
        output: &Path,
        version: &Version,
        info: &BuildInfo,
        build_time: DateTime<Utc>,
        config: &RuntimeConfig,
    ) -> ToolCommand {
        let mut command = ToolCommand::new("go")
            .current_dir(&self.source_dir)
            .env("GOOS", &job.platform)
            .env("GOARCH", job.arch.toolchain_name());

        if job.arch.is_arm() && !self.options.goarm.is_empty() {
            if !goarm_supported(&self.options.goarm) {
                config.warning_println(&format!(
                    "Invalid ARM build version: {}",
                    self.options.goarm
                ));
            }
            command = command.env("GOARM", &self.options.goarm);
        }

        command = command
            .args(["build", "-o"])
            .arg(output.to_string_lossy());
        if self.options.race {
            command = command.arg("-race");
        }

        let flags = self.syntax.render(
            &build_time.to_rfc3339_opts(SecondsFormat::Micros, true),
            &version.embedded(),
            &info.branch,
            &info.commit,
        );
        command.arg(format!("-ldflags={}", flags)).arg(entry)
    }

    async fn prepare_output_dir(&self, dir: &Path, config: &RuntimeConfig) -> Result<()> {
        if !dir.exists() {
            tokio::fs::create_dir_all(dir)
                .await
                .fs_context("creating output directory", dir)?;
        } else if self.options.clean && dir != Path::new("/") {
            config.println("Cleaning build directory...");
            tokio::fs::remove_dir_all(dir)
                .await
                .fs_context("cleaning output directory", dir)?;
            tokio::fs::create_dir_all(dir)
                .await
                .fs_context("creating output directory", dir)?;
        }
        Ok(())
    }

    fn print_plan(&self, job: &BuildJob, version: &Version, info: &BuildInfo, config: &RuntimeConfig) {
        config.section("Build Plan");
        config.indent(&format!("version: {}", version.embedded()));
        if let Some(rc) = version.release_candidate() {
            config.indent(&format!("release candidate: {}", rc));
        }
        config.indent(&format!("commit: {}", info.short_commit));
        config.indent(&format!("branch: {}", info.branch));
        config.indent(&format!("platform: {}", job.platform));
        config.indent(&format!("arch: {}", job.arch));
        if job.arch.is_arm() && !self.options.goarm.is_empty() {
            config.indent(&format!("ARM version: {}", self.options.goarm));
        }
        config.indent(&format!("nightly? {}", version.is_nightly()));
        config.indent(&format!("race enabled? {}", self.options.race));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Arch;
    use crate::process::ToolOutput;
    use crate::process::testing::RecordingRunner;
    use chrono::TimeZone;

    fn info() -> BuildInfo {
        BuildInfo {
            commit: "9f8e7d6c5b4a".to_string(),
            short_commit: "9f8e7d6".to_string(),
            branch: "master".to_string(),
        }
    }

    fn targets() -> BTreeMap<String, String> {
        BTreeMap::from([("ossia".to_string(), "main.go".to_string())])
    }

    fn build_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap()
    }

    #[tokio::test]
    async fn test_arm_job_command() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::succeeding();
        let targets = targets();
        let compiler = Compiler::new(
            &runner,
            "/src/ossia",
            &targets,
            LdflagsSyntax::Modern,
            CompileOptions {
                race: true,
                goarm: "7".to_string(),
                ..Default::default()
            },
        );
        let job = BuildJob {
            platform: "linux".to_string(),
            arch: Arch::Arm,
            output_dir: dir.path().join("linux/arm"),
        };
        let version = Version::new("1.2.0", Some(2), None, None).unwrap();
        compiler
            .build(&job, &version, &info(), build_time(), &RuntimeConfig::new(false))
            .await
            .unwrap();

        assert!(job.output_dir.is_dir());
        let calls = runner.calls_to("go");
        assert_eq!(calls.len(), 1);
        let cmd = &calls[0];
        assert_eq!(cmd.env_value("GOOS"), Some("linux"));
        assert_eq!(cmd.env_value("GOARCH"), Some("arm"));
        assert_eq!(cmd.env_value("GOARM"), Some("7"));
        assert_eq!(cmd.arg_after("-o"), Some(job.output_dir.join("ossia").to_str().unwrap()));
        assert!(cmd.args.contains(&"-race".to_string()));
        assert_eq!(cmd.args.last().map(String::as_str), Some("main.go"));
        let ldflags = cmd.args.iter().find(|a| a.starts_with("-ldflags=")).unwrap();
        assert!(ldflags.contains("-X main.version=1.2.0rc2"));
        assert!(ldflags.contains("-X main.commit=9f8e7d6c5b4a"));
        assert!(ldflags.contains("main.buildTime='2024-03-01T12:00:00.000000Z'"));
    }

    #[tokio::test]
    async fn test_i386_uses_toolchain_name_and_windows_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::succeeding();
        let targets = targets();
        let compiler = Compiler::new(
            &runner,
            dir.path(),
            &targets,
            LdflagsSyntax::Legacy,
            CompileOptions::default(),
        );
        let job = BuildJob {
            platform: "windows".to_string(),
            arch: Arch::I386,
            output_dir: dir.path().join("out"),
        };
        let version = Version::new("1.0", None, None, None).unwrap();
        compiler
            .build(&job, &version, &info(), build_time(), &RuntimeConfig::new(false))
            .await
            .unwrap();

        let cmd = &runner.calls_to("go")[0];
        assert_eq!(cmd.env_value("GOARCH"), Some("386"));
        assert_eq!(cmd.env_value("GOARM"), None);
        assert!(cmd.arg_after("-o").unwrap().ends_with("ossia.exe"));
        assert!(cmd.args.iter().any(|a| a.contains("-X main.version 1.0")));
    }

    #[tokio::test]
    async fn test_clean_recreates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("build");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("stale"), b"old").unwrap();

        let runner = RecordingRunner::succeeding();
        let targets = targets();
        let compiler = Compiler::new(
            &runner,
            dir.path(),
            &targets,
            LdflagsSyntax::Modern,
            CompileOptions {
                clean: true,
                ..Default::default()
            },
        );
        let job = BuildJob {
            platform: "linux".to_string(),
            arch: Arch::Amd64,
            output_dir: out.clone(),
        };
        let version = Version::new("1.0", None, None, None).unwrap();
        compiler
            .build(&job, &version, &info(), build_time(), &RuntimeConfig::new(false))
            .await
            .unwrap();
        assert!(out.is_dir());
        assert!(!out.join("stale").exists());
    }

    #[tokio::test]
    async fn test_compiler_failure_policy() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new(|_| ToolOutput::failed(2, "undefined: foo"));
        let targets = targets();
        let job = BuildJob {
            platform: "linux".to_string(),
            arch: Arch::Amd64,
            output_dir: dir.path().to_path_buf(),
        };
        let version = Version::new("1.0", None, None, None).unwrap();
        let config = RuntimeConfig::new(false);

        let fatal = Compiler::new(&runner, dir.path(), &targets, LdflagsSyntax::Modern, CompileOptions::default());
        let err = fatal
            .build(&job, &version, &info(), build_time(), &config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("undefined: foo"));

        let tolerant = Compiler::new(
            &runner,
            dir.path(),
            &targets,
            LdflagsSyntax::Modern,
            CompileOptions {
                policy: FailurePolicy::Tolerate,
                ..Default::default()
            },
        );
        tolerant
            .build(&job, &version, &info(), build_time(), &config)
            .await
            .unwrap();
    }

    #[test]
    fn test_goarm_versions() {
        assert!(goarm_supported("6"));
        assert!(goarm_supported("arm64"));
        assert!(!goarm_supported("8"));
    }
}
