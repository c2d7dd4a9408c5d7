//! Object store access through the `aws` command line client.

use super::UploadTarget;
use crate::error::{Result, ToolError};
use crate::process::{CommandRunner, FailurePolicy, ToolCommand, run_tool};
use std::future::Future;
use std::path::Path;

/// Remote store holding published artifacts.
pub trait ObjectStore {
    /// Whether an object already exists at `target`
    fn exists(&self, target: &UploadTarget) -> impl Future<Output = Result<bool>>;

    /// Write `file` to `target`, replacing any existing object
    fn upload(&self, file: &Path, target: &UploadTarget) -> impl Future<Output = Result<()>>;

    /// Grant anonymous read access to `target`
    fn make_public(&self, target: &UploadTarget) -> impl Future<Output = Result<()>>;
}

/// [`ObjectStore`] backed by `aws s3api` and `aws s3 cp`.
///
/// Credentials come from the client's own configuration chain.
pub struct AwsCliStore<'a, R> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> AwsCliStore<'a, R> {
    /// Create a store that runs `aws` through `runner`
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    fn s3api(&self, operation: &str, target: &UploadTarget) -> ToolCommand {
        ToolCommand::new("aws")
            .args(["s3api", operation])
            .arg("--bucket")
            .arg(&target.bucket)
            .arg("--key")
            .arg(&target.key)
    }
}

impl<R: CommandRunner> ObjectStore for AwsCliStore<'_, R> {
    async fn exists(&self, target: &UploadTarget) -> Result<bool> {
        let command = self.s3api("head-object", target);
        let output = self.runner.output(&command).await?;
        if output.success {
            return Ok(true);
        }

        let combined = output.combined();
        if combined.contains("404") || combined.contains("Not Found") {
            return Ok(false);
        }
        Err(ToolError::Failed {
            command: command.to_string(),
            code: output.code,
            output: combined,
        }
        .into())
    }

    async fn upload(&self, file: &Path, target: &UploadTarget) -> Result<()> {
        let command = ToolCommand::new("aws")
            .args(["s3", "cp"])
            .arg(file.to_string_lossy())
            .arg(target.to_string());
        run_tool(self.runner, &command, FailurePolicy::Fatal).await?;
        Ok(())
    }

    async fn make_public(&self, target: &UploadTarget) -> Result<()> {
        let command = self
            .s3api("put-object-acl", target)
            .args(["--acl", "public-read"]);
        run_tool(self.runner, &command, FailurePolicy::Fatal).await?;
        Ok(())
    }
}
