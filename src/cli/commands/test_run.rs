//! `--test` mode: format check, vet and tests instead of a build.

use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;
use crate::process::CommandRunner;
use crate::toolchain::run_tests;

/// Run the test suite; exit status 1 when any step fails
pub(super) async fn execute<R: CommandRunner>(runner: &R, args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let options = args.test_options()?;
    if run_tests(runner, &args.source, &options, config).await? {
        Ok(0)
    } else {
        Ok(1)
    }
}
