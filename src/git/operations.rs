//! Core Git operations trait and types for build metadata.
//!
//! This module defines the GitOperations trait that specifies the read-only
//! queries a release build needs. The implementation backed by the `git`
//! executable lives in the git_adapter module.

use crate::error::Result;
use std::future::Future;

/// Read-only Git queries used to stamp a build
pub trait GitOperations {
    /// Most recent tag reachable from HEAD
    fn current_version_tag(&self) -> impl Future<Output = Result<String>>;

    /// Commit hash of HEAD, abbreviated when `short` is set
    fn current_commit(&self, short: bool) -> impl Future<Output = Result<String>>;

    /// Name of the checked-out branch
    fn current_branch(&self) -> impl Future<Output = Result<String>>;
}

/// Commit and branch embedded into the binaries of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Full commit hash
    pub commit: String,
    /// Abbreviated commit hash
    pub short_commit: String,
    /// Branch name
    pub branch: String,
}

/// Read the build metadata once for the whole run.
///
/// `--commit` and `--branch` only replace the recorded values; nothing is
/// checked out.
pub async fn read_build_info<G: GitOperations>(
    git: &G,
    commit_override: Option<&str>,
    branch_override: Option<&str>,
) -> Result<BuildInfo> {
    let (commit, short_commit) = match commit_override {
        Some(commit) => {
            log::warn!(
                "Recording commit '{}' in build metadata; the working tree is not checked out at it",
                commit
            );
            let short: String = commit.chars().take(7).collect();
            (commit.to_string(), short)
        }
        None => (
            git.current_commit(false).await?,
            git.current_commit(true).await?,
        ),
    };

    let branch = match branch_override {
        Some(branch) => {
            log::warn!(
                "Recording branch '{}' in build metadata; the working tree is not switched to it",
                branch
            );
            branch.to_string()
        }
        None => git.current_branch().await?,
    };

    Ok(BuildInfo {
        commit,
        short_commit,
        branch,
    })
}
