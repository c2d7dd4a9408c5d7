//! Bundle orchestration and coordination.
//!
//! This module provides the main [`Bundler`] orchestrator that turns a
//! [`BuildOutput`] into packages.
//!
//! # Overview
//!
//! For each built (platform, architecture), in build order, the bundler:
//! 1. Stages the install tree in a fresh temporary directory
//! 2. Copies scripts, renders sample configs and copies binaries
//! 3. Runs the package builder once per format declared for the platform
//! 4. Renames nightly system packages and hashes every result
//! 5. Drops the staging directory, on success and on every error path
//!
//! # Example
//!
//! ```no_run
//! use release_matrix::bundler::Bundler;
//! use release_matrix::cli::RuntimeConfig;
//! use release_matrix::matrix::BuildOutput;
//! use release_matrix::metadata::ProjectConfig;
//! use release_matrix::process::SystemRunner;
//! use release_matrix::version::Version;
//! use std::path::Path;
//!
//! # async fn example() -> release_matrix::Result<()> {
//! let runner = SystemRunner::new(false);
//! let project = ProjectConfig::load(Path::new("."), None)?;
//! let version = Version::new("1.0.0", None, None, None)?;
//! let bundler = Bundler::new(&runner, &project, ".");
//! let packages = bundler
//!     .package_all(&BuildOutput::new(), &version, None, &RuntimeConfig::new(false))
//!     .await?;
//! for package in packages {
//!     println!("{} ({} bytes) md5 {}", package.path.display(), package.size, package.md5);
//! }
//! # Ok(())
//! # }
//! ```

use super::fpm::{FpmInvocation, fpm_command, parse_output_path};
use super::naming::{nightly_file_name, package_arch_label, plan_artifact};
use super::staging::{StagedTree, template_renderer};
use super::utils::fs;
use super::{Package, PackageType};
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::matrix::{BuildJob, BuildOutput};
use crate::metadata::ProjectConfig;
use crate::process::{CommandRunner, FailurePolicy, run_tool};
use crate::version::Version;
use std::path::{Path, PathBuf};

/// Packages compiled build jobs with the external package builder.
pub struct Bundler<'a, R> {
    runner: &'a R,
    project: &'a ProjectConfig,
    source_dir: PathBuf,
    policy: FailurePolicy,
}

impl<'a, R: CommandRunner> Bundler<'a, R> {
    /// Create a bundler for the project checked out at `source_dir`
    pub fn new(runner: &'a R, project: &'a ProjectConfig, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            project,
            source_dir: source_dir.into(),
            policy: FailurePolicy::Fatal,
        }
    }

    /// What a failing package builder does to the run
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Package every job of `output` in build order.
    ///
    /// `pkg_arch` overrides the architecture written into the packages.
    pub async fn package_all(
        &self,
        output: &BuildOutput,
        version: &Version,
        pkg_arch: Option<&str>,
        config: &RuntimeConfig,
    ) -> Result<Vec<Package>> {
        config.section("Packaging");
        let templates = template_renderer();
        let mut packages = Vec::new();

        for job in output.iter() {
            let Some(formats) = self.project.packages.get(&job.platform) else {
                config.warning_println(&format!(
                    "No package formats declared for platform '{}', skipping",
                    job.platform
                ));
                continue;
            };

            let tree = StagedTree::create(self.project, job, version).await?;
            log::debug!("[{}][{}] staging in {}", job.platform, job.arch, tree.path().display());
            tree.add_scripts(self.project, &self.source_dir, &templates).await?;
            tree.add_binaries(self.project, job).await?;

            for &package_type in formats {
                if let Some(package) = self
                    .package_one(package_type, job, version, pkg_arch, &tree, config)
                    .await?
                {
                    packages.push(package);
                }
            }
            // `tree` drops here and removes the staging directory
        }

        log::debug!("Created {} package(s)", packages.len());
        Ok(packages)
    }

    async fn package_one(
        &self,
        package_type: PackageType,
        job: &BuildJob,
        version: &Version,
        pkg_arch: Option<&str>,
        tree: &StagedTree,
        config: &RuntimeConfig,
    ) -> Result<Option<Package>> {
        config.println(&format!(
            "Packaging directory '{}' as '{}'...",
            tree.build_root().display(),
            package_type
        ));

        let plan = plan_artifact(
            package_type,
            self.project.name(),
            version,
            job,
            tree.build_root(),
            tree.archive_root(),
        );
        let arch = package_arch_label(pkg_arch, &job.arch);
        let package_version = version.package_version();
        let iteration = version.package_iteration();

        let invocation = FpmInvocation {
            package_type,
            name: &plan.name,
            arch: &arch,
            version: &package_version,
            iteration: &iteration,
            root: &plan.root,
            output: &plan.output,
            verbose: config.is_debug(),
        };
        let command = fpm_command(self.project, &self.source_dir, &invocation);

        let Some(out) = run_tool(self.runner, &command, self.policy).await? else {
            return Ok(None);
        };

        let Some(created) = parse_output_path(&out) else {
            config.warning_println("Could not determine output from packaging command.");
            return Ok(None);
        };
        let mut path = if created.is_absolute() {
            created
        } else {
            self.source_dir.join(created)
        };

        if version.is_nightly() && matches!(package_type, PackageType::Deb | PackageType::Rpm) {
            path = rename_nightly(&path, &package_version, version.iteration(), config).await;
        }

        let (size, md5) = fs::md5_file(&path).await?;
        config.println(&format!("MD5({}) = {}", path.display(), md5));

        Ok(Some(Package {
            package_type,
            name: plan.name,
            path,
            platform: job.platform.clone(),
            package_arch: arch,
            iteration,
            size,
            md5,
        }))
    }
}

/// Strip the nightly version from a system package file name.
///
/// A failed rename is reported and the original path kept.
async fn rename_nightly(path: &Path, package_version: &str, iteration: u32, config: &RuntimeConfig) -> PathBuf {
    let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return path.to_path_buf();
    };
    let renamed = nightly_file_name(&file_name, package_version, iteration);
    if renamed == file_name {
        return path.to_path_buf();
    }

    let target = path.with_file_name(&renamed);
    match tokio::fs::rename(path, &target).await {
        Ok(()) => target,
        Err(e) => {
            config.warning_println(&format!(
                "Failed to rename '{}' to '{}': {}",
                path.display(),
                target.display(),
                e
            ));
            path.to_path_buf()
        }
    }
}
