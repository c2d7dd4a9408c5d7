//! Compiler toolchain integration.
//!
//! Detects the installed Go toolchain once per run, selects the linker flag
//! syntax for it, and drives compilation, tests and dependency retrieval.

mod compiler;
mod ldflags;
mod test_suite;

pub use compiler::{CompileOptions, Compiler, goarm_supported};
pub use ldflags::{LdflagsSyntax, parse_go_version};
pub use test_suite::{TestOptions, run_tests};

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::process::{CommandRunner, FailurePolicy, ToolCommand, run_tool};
use std::path::Path;

/// The detected compiler toolchain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Reported version, e.g. `1.21.5`, when detection succeeded
    pub version: Option<String>,
    /// Linker flag syntax for this toolchain
    pub syntax: LdflagsSyntax,
}

impl Toolchain {
    /// Detect the toolchain with `go version`.
    ///
    /// Detection is best effort: a failed or unparseable call selects the
    /// modern flag syntax.
    pub async fn detect<R: CommandRunner>(runner: &R, source_dir: &Path) -> Result<Self> {
        let command = ToolCommand::new("go").arg("version").current_dir(source_dir);
        let version = run_tool(runner, &command, FailurePolicy::Tolerate)
            .await?
            .and_then(|out| parse_go_version(&out));

        let syntax = version
            .as_deref()
            .map(LdflagsSyntax::for_go_version)
            .unwrap_or_default();

        log::debug!("Detected Go toolchain {:?}, using {:?} ldflags", version, syntax);
        Ok(Self { version, syntax })
    }
}

/// Retrieve or update dependencies before building.
///
/// Runs `go mod download` followed by `go get -u ./...`.
pub async fn fetch_dependencies<R: CommandRunner>(
    runner: &R,
    source_dir: &Path,
    config: &RuntimeConfig,
) -> Result<()> {
    config.println("Retrieving dependencies...");
    let download = ToolCommand::new("go")
        .args(["mod", "download"])
        .current_dir(source_dir);
    run_tool(runner, &download, FailurePolicy::Fatal).await?;

    config.println("Updating dependencies...");
    let update = ToolCommand::new("go")
        .args(["get", "-u", "./..."])
        .current_dir(source_dir);
    run_tool(runner, &update, FailurePolicy::Fatal).await?;
    Ok(())
}
