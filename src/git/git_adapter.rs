//! `GitOperations` backed by the `git` executable.

use crate::error::{Result, VersionError};
use crate::git::GitOperations;
use crate::process::{CommandRunner, FailurePolicy, ToolCommand, run_tool};
use std::path::PathBuf;

/// Git adapter running `git` in a repository directory
#[derive(Debug, Clone)]
pub struct GitCli<'a, R> {
    runner: &'a R,
    repo_dir: PathBuf,
}

impl<'a, R: CommandRunner> GitCli<'a, R> {
    /// Create an adapter for the repository at `repo_dir`
    pub fn new(runner: &'a R, repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            repo_dir: repo_dir.into(),
        }
    }

    fn git<I, S>(&self, args: I) -> ToolCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ToolCommand::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
    }

    async fn query(&self, command: ToolCommand) -> Result<String> {
        let out = run_tool(self.runner, &command, FailurePolicy::Fatal).await?;
        Ok(clean(&out.unwrap_or_default()))
    }
}

/// Strip whitespace and the quotes some `--pretty` formats leave behind
fn clean(output: &str) -> String {
    output.trim_matches(|c: char| c == '\'' || c.is_whitespace()).to_string()
}

impl<R: CommandRunner> GitOperations for GitCli<'_, R> {
    async fn current_version_tag(&self) -> Result<String> {
        let command = self.git(["describe", "--always", "--tags", "--abbrev=0"]);
        let tag = self.query(command).await.map_err(|e| VersionError::Unavailable {
            reason: e.to_string(),
        })?;
        if tag.is_empty() {
            return Err(VersionError::Unavailable {
                reason: "git describe returned no tag".to_string(),
            }
            .into());
        }
        Ok(tag)
    }

    async fn current_commit(&self, short: bool) -> Result<String> {
        let command = if short {
            self.git(["log", "--pretty=format:%h", "-n", "1"])
        } else {
            self.git(["rev-parse", "HEAD"])
        };
        self.query(command).await
    }

    async fn current_branch(&self) -> Result<String> {
        self.query(self.git(["rev-parse", "--abbrev-ref", "HEAD"])).await
    }
}
