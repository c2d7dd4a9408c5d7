//! release_matrix - cross-compile, package and publish release artifacts.
//!
//! Exits 0 on success and 1 on any fatal error or test failure.

use release_matrix::cli;
use release_matrix::cli::RuntimeConfig;
use std::process;

#[tokio::main]
async fn main() {
    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            cli::report_error(&RuntimeConfig::new(false), &e);
            process::exit(1);
        }
    }
}
