//! Build, package and upload run.

use crate::bundler::Bundler;
use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;
use crate::git::{GitCli, read_build_info};
use crate::matrix::{self, BuildOutput};
use crate::metadata::ProjectConfig;
use crate::process::CommandRunner;
use crate::publish::{AwsCliStore, UploadOutcome, Uploader};
use crate::toolchain::{Compiler, Toolchain};
use crate::version;
use chrono::Utc;

/// Compile every planned job, then package and upload when requested
pub(super) async fn execute<R: CommandRunner>(
    runner: &R,
    args: &Args,
    project: &ProjectConfig,
    bucket: Option<&str>,
    config: &RuntimeConfig,
) -> Result<i32> {
    let git = GitCli::new(runner, &args.source);
    let version = version::resolve(&git, &args.version_request()?, Utc::now()).await?;
    let info = read_build_info(&git, args.commit.as_deref(), args.branch.as_deref()).await?;
    let toolchain = Toolchain::detect(runner, &args.source).await?;
    if let Some(go_version) = &toolchain.version {
        config.verbose_println(&format!("Go version {}", go_version));
    }

    let jobs = matrix::plan(
        &args.platform_selector(),
        &args.arch_selector(),
        &project.builds,
        &args.output_dir(),
    )?;

    let compiler = Compiler::new(
        runner,
        &args.source,
        &project.targets,
        toolchain.syntax,
        args.compile_options(),
    );
    let build_time = Utc::now();
    let mut output = BuildOutput::new();
    for job in jobs {
        compiler.build(&job, &version, &info, build_time, config).await?;
        output.record(job);
    }
    config.success_println(&format!("Built {} job(s) for version {}", output.len(), version));

    if !args.package {
        if args.upload {
            config.warning_println("Cannot upload without packaging; pass --package as well.");
        }
        return Ok(0);
    }

    let packages = Bundler::new(runner, project, &args.source)
        .package_all(&output, &version, args.pkgarch.as_deref(), config)
        .await?;

    if let Some(bucket) = bucket {
        let outcomes = Uploader::new(AwsCliStore::new(runner))
            .upload_packages(&packages, bucket, version.is_nightly(), config)
            .await?;
        let skipped = outcomes
            .iter()
            .filter(|o| matches!(o, UploadOutcome::Skipped(_)))
            .count();
        if skipped > 0 {
            config.println(&format!("{} package(s) were already uploaded", skipped));
        }
    }

    config.success_println("Done!");
    Ok(0)
}
