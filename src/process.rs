//! External process execution.
//!
//! Every collaborator (compiler, VCS, package builder, object store client,
//! test runner) is reached through [`CommandRunner`], so the orchestration
//! code never spawns processes directly.

use crate::error::{Result, ToolError};
use std::ffi::OsString;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

/// What to do when an external command fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the run with a [`ToolError`]
    #[default]
    Fatal,
    /// Log the failure and continue; used for best-effort diagnostic calls
    Tolerate,
}

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Executable name or path
    pub program: String,
    /// Arguments, passed verbatim (no shell)
    pub args: Vec<String>,
    /// Environment overrides layered over the inherited environment
    pub envs: Vec<(String, String)>,
    /// Working directory, inherited when `None`
    pub current_dir: Option<PathBuf>,
    /// Stream output to the terminal instead of capturing it
    pub inherit_stdio: bool,
}

impl ToolCommand {
    /// Create a command for the given program
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
            inherit_stdio: false,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment override
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Run in the given directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Stream stdout/stderr to the terminal
    pub fn inherit_stdio(mut self) -> Self {
        self.inherit_stdio = true;
        self
    }

    /// Value of the argument following `flag`, if any
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Value of an environment override, if set
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.envs {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    /// Captured stdout (empty when stdio was inherited)
    pub stdout: String,
    /// Captured stderr (empty when stdio was inherited)
    pub stderr: String,
}

impl ToolOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// stdout followed by stderr, the way a merged stream would read
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        out.push_str(&self.stderr);
        out
    }
}

/// Executes external commands.
pub trait CommandRunner {
    /// Run the command to completion and capture its output.
    ///
    /// Only spawn failures are errors here; a non-zero exit is reported
    /// through [`ToolOutput::success`].
    fn output(&self, command: &ToolCommand) -> impl Future<Output = Result<ToolOutput>>;
}

/// Runs commands on the host with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    debug: bool,
}

impl SystemRunner {
    /// Create a runner; in debug mode every command line is printed
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl CommandRunner for SystemRunner {
    async fn output(&self, command: &ToolCommand) -> Result<ToolOutput> {
        if self.debug {
            println!("[DEBUG] {}", command);
        }
        log::debug!("running {}", command);

        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(command.args.iter().map(OsString::from));
        for (key, value) in &command.envs {
            cmd.env(key, value);
        }
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }

        let spawn_failed = |source| ToolError::SpawnFailed {
            command: command.to_string(),
            source,
        };

        if command.inherit_stdio {
            let status = cmd
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .map_err(spawn_failed)?;
            return Ok(ToolOutput {
                success: status.success(),
                code: status.code(),
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(spawn_failed)?;

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run a command and apply the failure policy.
///
/// Returns the combined output on success. On failure a fatal policy yields
/// a [`ToolError`]; a tolerant policy logs the command and its output and
/// returns `Ok(None)`.
pub async fn run_tool<R: CommandRunner>(
    runner: &R,
    command: &ToolCommand,
    policy: FailurePolicy,
) -> Result<Option<String>> {
    let error = match runner.output(command).await {
        Ok(output) if output.success => return Ok(Some(output.combined())),
        Ok(output) => ToolError::Failed {
            command: command.to_string(),
            code: output.code,
            output: output.combined(),
        },
        Err(crate::error::ReleaseError::Tool(err)) => err,
        Err(other) => return Err(other),
    };

    match policy {
        FailurePolicy::Fatal => Err(error.into()),
        FailurePolicy::Tolerate => {
            log::warn!("Executed command failed, continuing: {}", error);
            Ok(None)
        }
    }
}
