//! Staged install trees.
//!
//! A [`StagedTree`] mirrors the installed filesystem layout of one
//! (platform, architecture) inside a temporary directory. The directory is
//! removed when the tree is dropped.

use crate::bundler::error::{Context, ErrorExt, Result};
use crate::bundler::utils::fs;
use crate::matrix::BuildJob;
use crate::metadata::{ProjectConfig, staged_path};
use crate::version::Version;
use handlebars::Handlebars;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DIR_MODE: u32 = 0o755;
const SCRIPT_MODE: u32 = 0o644;

/// Ephemeral install tree for one packaging pass
#[derive(Debug)]
pub(crate) struct StagedTree {
    dir: TempDir,
    build_root: PathBuf,
}

impl StagedTree {
    /// Create the temporary directory and the empty install layout.
    pub(crate) async fn create(
        project: &ProjectConfig,
        job: &BuildJob,
        version: &Version,
    ) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-build.", project.name()))
            .tempdir()
            .fs_context("creating staging directory", std::env::temp_dir())?;

        let build_root = dir
            .path()
            .join(&job.platform)
            .join(job.arch.package_label())
            .join(format!(
                "{}-{}-{}",
                project.name(),
                version.package_version(),
                version.iteration()
            ));

        log::info!("Creating package filesystem at root: {}", build_root.display());
        fs::create_dir_all(&build_root, DIR_MODE).await?;
        for layout_dir in project.layout.directories() {
            fs::create_dir_all(&staged_path(&build_root, &layout_dir), DIR_MODE).await?;
        }

        Ok(Self { dir, build_root })
    }

    /// Root of the install tree, packaged directly by system package formats
    pub(crate) fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Directory one level above the build root, used as archive root
    pub(crate) fn archive_root(&self) -> &Path {
        self.build_root.parent().unwrap_or(self.dir.path())
    }

    /// The temporary directory holding the tree
    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Location of an absolute install path inside the tree
    pub(crate) fn locate(&self, installed: &Path) -> PathBuf {
        staged_path(&self.build_root, installed)
    }

    /// Copy the service scripts and log-rotation rule, and render the
    /// sample configs.
    pub(crate) async fn add_scripts(
        &self,
        project: &ProjectConfig,
        source_dir: &Path,
        templates: &Handlebars<'_>,
    ) -> Result<()> {
        log::info!("Copying scripts and sample configuration to build directory");
        let script_dir = self.locate(&project.layout.script_dir());
        let scripts = &project.scripts;

        for (script, mode) in [
            (&scripts.systemd, Some(SCRIPT_MODE)),
            (&scripts.init, Some(SCRIPT_MODE)),
            (&scripts.upstart, None),
        ] {
            let from = source_dir.join(script);
            let to = script_dir.join(file_name(script)?);
            fs::copy_file(&from, &to)
                .await
                .with_context(|| format!("staging script '{}'", script.display()))?;
            if let Some(mode) = mode {
                fs::set_mode(&to, mode).await?;
            }
        }

        let logrotate = self.locate(&project.layout.logrotate_file());
        fs::copy_file(&source_dir.join(&scripts.logrotate), &logrotate).await?;
        fs::set_mode(&logrotate, SCRIPT_MODE).await?;

        let config_dir = self.locate(&project.layout.config_dir());
        let data = BTreeMap::from([(
            "log_dir",
            project.layout.log_dir().display().to_string(),
        )]);
        for template in &scripts.app_configs {
            let path = source_dir.join(template);
            let source = tokio::fs::read_to_string(&path)
                .await
                .fs_context("reading sample config", &path)?;
            let rendered = templates.render_template(&source, &data)?;
            let target = config_dir.join(rendered_name(template)?);
            tokio::fs::write(&target, rendered)
                .await
                .fs_context("writing sample config", &target)?;
        }
        Ok(())
    }

    /// Copy every target binary of `job` into the tree's binary directory.
    pub(crate) async fn add_binaries(&self, project: &ProjectConfig, job: &BuildJob) -> Result<()> {
        let bin_dir = self.locate(&project.layout.bin_dir());
        for target in project.targets.keys() {
            let binary = job.binary_name(target);
            let from = job.output_dir.join(&binary);
            let to = bin_dir.join(&binary);
            log::debug!("[{}][{}] Copying '{}' to '{}'", job.platform, job.arch, from.display(), to.display());
            fs::copy_file(&from, &to).await.with_context(|| {
                format!("staging binary '{}' for {}/{}", binary, job.platform, job.arch)
            })?;
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name()
        .with_context(|| format!("{} has no file name", path.display()))
}

/// `etc/conf.yml.example` renders to `conf.yml`
fn rendered_name(template: &Path) -> Result<String> {
    let name = file_name(template)?.to_string_lossy();
    Ok(match name.find(".example") {
        Some(idx) => name[..idx].to_string(),
        None => name.into_owned(),
    })
}

/// Template renderer for sample configs; output is written verbatim
pub(crate) fn template_renderer() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
}
