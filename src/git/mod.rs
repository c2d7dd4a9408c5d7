//! Git integration for build metadata.
//!
//! Provides the tag, commit and branch a build is stamped with.

mod git_adapter;
mod operations;

pub use git_adapter::GitCli;
pub use operations::{BuildInfo, GitOperations, read_build_info};
