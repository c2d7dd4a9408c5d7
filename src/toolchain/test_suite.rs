//! Format check, vet and test run for `--test`.

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::process::{CommandRunner, ToolCommand};
use std::path::Path;

/// Options of a test run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestOptions {
    /// Enable the race detector
    pub race: bool,
    /// `-parallel` value
    pub parallel: Option<u32>,
    /// `-timeout` value, passed through verbatim (e.g. `480s`)
    pub timeout: Option<String>,
    /// Skip `go vet`
    pub no_vet: bool,
}

/// Run the test suite. Returns whether every step passed.
///
/// Formatting and vet problems are reported from their output; the test run
/// streams to the terminal and is judged by its exit status.
pub async fn run_tests<R: CommandRunner>(
    runner: &R,
    source_dir: &Path,
    options: &TestOptions,
    config: &RuntimeConfig,
) -> Result<bool> {
    config.section("Running tests");
    config.indent(&format!("Race: {}", options.race));
    if let Some(parallel) = options.parallel {
        config.indent(&format!("Parallel: {}", parallel));
    }
    if let Some(timeout) = &options.timeout {
        config.indent(&format!("Timeout: {}", timeout));
    }

    let fmt = ToolCommand::new("go")
        .args(["fmt", "./..."])
        .current_dir(source_dir);
    let out = runner.output(&fmt).await?;
    if !out.success || !out.combined().trim().is_empty() {
        config.error_println("Code not formatted. Please use 'go fmt ./...' to fix formatting errors.");
        config.println(&out.combined());
        return Ok(false);
    }

    if options.no_vet {
        config.println("Skipping go vet ...");
    } else {
        let vet = ToolCommand::new("go")
            .args(["vet", "./..."])
            .current_dir(source_dir);
        let out = runner.output(&vet).await?;
        if !out.success || !out.combined().trim().is_empty() {
            config.error_println("Go vet failed. Please run 'go vet ./...' and fix any errors.");
            config.println(&out.combined());
            return Ok(false);
        }
    }

    let mut test = ToolCommand::new("go")
        .args(["test", "-v"])
        .current_dir(source_dir)
        .inherit_stdio();
    if options.race {
        test = test.arg("-race");
    }
    if let Some(parallel) = options.parallel {
        test = test.arg("-parallel").arg(parallel.to_string());
    }
    if let Some(timeout) = &options.timeout {
        test = test.arg("-timeout").arg(timeout);
    }
    test = test.arg("./...");

    let out = runner.output(&test).await?;
    if out.success {
        config.success_println("Tests Passed");
        Ok(true)
    } else {
        config.error_println("Tests Failed");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ToolOutput;
    use crate::process::testing::RecordingRunner;

    #[tokio::test]
    async fn test_passing_suite_runs_all_steps() {
        let runner = RecordingRunner::succeeding();
        let options = TestOptions {
            race: true,
            parallel: Some(4),
            timeout: Some("480s".to_string()),
            no_vet: false,
        };
        let passed = run_tests(&runner, Path::new("."), &options, &RuntimeConfig::new(false))
            .await
            .unwrap();
        assert!(passed);

        let calls = runner.calls_to("go");
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].args, vec!["fmt", "./..."]);
        assert_eq!(calls[1].args, vec!["vet", "./..."]);
        assert_eq!(
            calls[2].args,
            vec!["test", "-v", "-race", "-parallel", "4", "-timeout", "480s", "./..."]
        );
        assert!(calls[2].inherit_stdio);
    }

    #[tokio::test]
    async fn test_unformatted_code_fails_before_tests() {
        let runner = RecordingRunner::new(|cmd| {
            if cmd.args.first().map(String::as_str) == Some("fmt") {
                ToolOutput::ok("main.go\n")
            } else {
                ToolOutput::ok("")
            }
        });
        let passed = run_tests(&runner, Path::new("."), &TestOptions::default(), &RuntimeConfig::new(false))
            .await
            .unwrap();
        assert!(!passed);
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_no_vet_and_failing_tests() {
        let runner = RecordingRunner::new(|cmd| {
            if cmd.args.first().map(String::as_str) == Some("test") {
                ToolOutput::failed(1, "")
            } else {
                ToolOutput::ok("")
            }
        });
        let options = TestOptions {
            no_vet: true,
            ..Default::default()
        };
        let passed = run_tests(&runner, Path::new("."), &options, &RuntimeConfig::new(false))
            .await
            .unwrap();
        assert!(!passed);
        let calls = runner.calls_to("go");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].args, vec!["test", "-v", "./..."]);
    }
}
