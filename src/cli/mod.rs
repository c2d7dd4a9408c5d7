//! Command line interface for release_matrix.
//!
//! This module provides argument parsing, logging setup, command execution
//! and colored user feedback.

mod args;
pub mod commands;
mod output;

pub use args::{Args, RuntimeConfig};
pub use commands::{execute_command, report_error};
pub use output::OutputManager;

use crate::error::Result;
use clap::Parser;

/// Main CLI entry point.
///
/// Returns the process exit code: `--help` exits 0, any other argument error
/// prints usage and exits 1.
pub async fn run() -> Result<i32> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return Ok(if e.use_stderr() { 1 } else { 0 });
        }
    };
    init_logging(args.debug);
    execute_command(args).await
}

/// Initialize `env_logger`; `RUST_LOG` wins over the default level
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}
