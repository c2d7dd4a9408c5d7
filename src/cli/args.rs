//! Command line argument parsing and validation.
//!
//! Every option uses the `--flag=value` form. Numeric options are kept as
//! text here and validated together, before any work starts.

use crate::error::{ConfigError, Result};
use crate::matrix::{host_arch, host_platform};
use crate::preflight::Stages;
use crate::toolchain::{CompileOptions, TestOptions};
use crate::version::{VersionRequest, parse_number};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Cross-compile, package and publish release artifacts
#[derive(Parser, Debug, Clone)]
#[command(
    name = "release_matrix",
    about = "Cross-compile, package and publish release artifacts",
    long_about = "Build the targets declared in release.toml for a platform/architecture matrix,
optionally package them with fpm and upload the packages to S3.

Usage:
  release_matrix --platform=linux --arch=all --package
  release_matrix --nightly --platform=all --arch=all --package --upload
  release_matrix --test --race --parallel=4 --timeout=480s",
    disable_version_flag = true
)]
pub struct Args {
    /// Version to build; defaults to the most recent tag reachable from HEAD
    #[arg(long = "version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Release candidate number
    #[arg(long, value_name = "N")]
    pub rc: Option<String>,

    /// Build a nightly (timestamped version, overwritten on upload)
    #[arg(long)]
    pub nightly: bool,

    /// Target platform, or `all`; defaults to the host platform
    #[arg(long, value_name = "NAME")]
    pub platform: Option<String>,

    /// Target architecture, or `all`; defaults to the host architecture
    #[arg(long, value_name = "NAME")]
    pub arch: Option<String>,

    /// Architecture written into the packages
    #[arg(long, value_name = "NAME")]
    pub pkgarch: Option<String>,

    /// ARM sub-version for arm builds (5, 6, 7, arm64)
    #[arg(long, value_name = "VERSION", default_value = "6")]
    pub goarm: String,

    /// Build with the race detector
    #[arg(long)]
    pub race: bool,

    /// Package the built binaries
    #[arg(long)]
    pub package: bool,

    /// Upload the packages
    #[arg(long)]
    pub upload: bool,

    /// Upload destination `bucket[/prefix]`; defaults to release.toml
    #[arg(long, value_name = "PATH")]
    pub bucket: Option<String>,

    /// Package iteration
    #[arg(long, value_name = "N")]
    pub iteration: Option<String>,

    /// Remove the output directory before building
    #[arg(long)]
    pub clean: bool,

    /// Output directory for binaries and packages
    #[arg(long, value_name = "PATH", default_value = "build")]
    pub outdir: PathBuf,

    /// Run the test suite instead of building
    #[arg(long)]
    pub test: bool,

    /// Maximum number of tests run in parallel
    #[arg(long, value_name = "N")]
    pub parallel: Option<String>,

    /// Test timeout, passed through to the test runner (e.g. 480s)
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Skip vet when testing
    #[arg(long)]
    pub no_vet: bool,

    /// Retrieve and update dependencies before building
    #[arg(long)]
    pub update: bool,

    /// Do not retrieve dependencies
    #[arg(long)]
    pub no_get: bool,

    /// Run code generation (accepted, currently a no-op)
    #[arg(long)]
    pub generate: bool,

    /// Commit hash recorded in the binaries
    #[arg(long, value_name = "HASH")]
    pub commit: Option<String>,

    /// Branch name recorded in the binaries
    #[arg(long, value_name = "NAME")]
    pub branch: Option<String>,

    /// Print every command and extra diagnostics
    #[arg(long)]
    pub debug: bool,

    /// Path of the release configuration; defaults to <source>/release.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Source checkout to build
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub source: PathBuf,
}

impl Args {
    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<()> {
        self.version_request()?;
        self.test_options()?;
        if let Some(version) = &self.version
            && version.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue {
                name: "--version".to_string(),
                value: version.clone(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Version inputs, with numeric options parsed
    pub fn version_request(&self) -> Result<VersionRequest> {
        let request = VersionRequest {
            version: self.version.clone(),
            release_candidate: self.rc.as_deref().map(|rc| parse_number("--rc", rc)).transpose()?,
            nightly: self.nightly,
            iteration: self
                .iteration
                .as_deref()
                .map(|n| parse_number("--iteration", n))
                .transpose()?,
        };
        request.validate()?;
        Ok(request)
    }

    /// Options of a `--test` run
    pub fn test_options(&self) -> Result<TestOptions> {
        Ok(TestOptions {
            race: self.race,
            parallel: self
                .parallel
                .as_deref()
                .map(|n| parse_number("--parallel", n))
                .transpose()?,
            timeout: self.timeout.clone(),
            no_vet: self.no_vet,
        })
    }

    /// Options shared by every compile job
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            race: self.race,
            goarm: self.goarm.clone(),
            clean: self.clean,
            ..CompileOptions::default()
        }
    }

    /// Stages that need extra tools; a test run needs none
    pub fn stages(&self) -> Stages {
        if self.test {
            return Stages::default();
        }
        Stages {
            package: self.package,
            upload: self.upload,
        }
    }

    /// Platform selector, defaulting to the host
    pub fn platform_selector(&self) -> String {
        self.platform.clone().unwrap_or_else(host_platform)
    }

    /// Architecture selector, defaulting to the host
    pub fn arch_selector(&self) -> String {
        self.arch
            .clone()
            .unwrap_or_else(|| host_arch().package_label().to_string())
    }

    /// Whether dependencies are retrieved before building
    pub fn fetch_dependencies(&self) -> bool {
        self.update && !self.no_get
    }

    /// Anchor `--source` to the process working directory.
    ///
    /// External tools run inside the source checkout while staging reads
    /// from the current directory, so every job path has to be absolute.
    pub fn with_absolute_source(mut self) -> Result<Self> {
        self.source = std::path::absolute(&self.source).map_err(|e| ConfigError::InvalidValue {
            name: "--source".to_string(),
            value: self.source.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(self)
    }

    /// Output directory, relative paths resolved against the source checkout
    pub fn output_dir(&self) -> PathBuf {
        resolve_against(&self.source, &self.outdir)
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(debug: bool) -> Self {
        Self {
            output: super::OutputManager::new(debug),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print debug message (only with `--debug`)
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        let _ = self.output.section(title);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if debug output is enabled
    pub fn is_debug(&self) -> bool {
        self.output.is_debug()
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.debug)
    }
}
