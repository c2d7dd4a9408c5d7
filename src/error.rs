//! Comprehensive error types for release_matrix operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release_matrix operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release_matrix operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Configuration errors (conflicting flags, missing tools, bad release.toml)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Version resolution errors
    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    /// Build matrix errors
    #[error("Target error: {0}")]
    Target(#[from] TargetError),

    /// External tool failures (compiler, package builder, VCS, object store)
    #[error("External tool failure: {0}")]
    Tool(#[from] ToolError),

    /// Packaging errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Configuration errors, always reported before any build work starts
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Mutually exclusive options were requested together
    #[error("Conflicting options: {flags:?} ({reason})")]
    ConflictingFlags {
        /// Options that conflict
        flags: Vec<String>,
        /// Why they conflict
        reason: String,
    },

    /// A required external executable is not on PATH
    #[error("Required tool '{tool}' was not found on PATH ({purpose})")]
    MissingTool {
        /// Executable name
        tool: String,
        /// What the tool is needed for
        purpose: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// An option or configuration value is not acceptable
    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        /// Option or key name
        name: String,
        /// Offending value
        value: String,
        /// Reason for the error
        reason: String,
    },

    /// release.toml could not be read or parsed
    #[error("Invalid release configuration at {path}: {reason}")]
    InvalidConfigFile {
        /// Path of the configuration file
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// Version resolution errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// The VCS could not produce a version tag
    #[error("Version unavailable: {reason}")]
    Unavailable {
        /// Reason for the error
        reason: String,
    },

    /// A numeric option was not a non-negative integer
    #[error("Invalid {name} '{value}': expected a non-negative integer")]
    InvalidNumber {
        /// Option name
        name: String,
        /// Offending value
        value: String,
    },
}

/// Build matrix errors
#[derive(Error, Debug)]
pub enum TargetError {
    /// Platform is not a key of the supported-builds table
    #[error("Unsupported platform '{platform}' (supported: {supported:?})")]
    UnsupportedPlatform {
        /// Requested platform
        platform: String,
        /// Platforms declared in release.toml
        supported: Vec<String>,
    },

    /// Architecture is not declared for the platform
    #[error("Unsupported architecture '{arch}' for platform '{platform}' (supported: {supported:?})")]
    UnsupportedArch {
        /// Platform being expanded
        platform: String,
        /// Requested architecture
        arch: String,
        /// Architectures declared for the platform
        supported: Vec<String>,
    },
}

/// External tool errors
#[derive(Error, Debug)]
pub enum ToolError {
    /// The command ran and exited unsuccessfully
    #[error("Command failed: {command} (exit code {code:?})\n{output}")]
    Failed {
        /// Command line that was run
        command: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Captured stdout and stderr
        output: String,
    },

    /// The command could not be started at all
    #[error("Invalid command: {command} - {source}")]
    SpawnFailed {
        /// Command line that was attempted
        command: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Config(ConfigError::ConflictingFlags { flags, .. }) => vec![
                format!("Pass only one of: {}", flags.join(", ")),
                "An RC tag on HEAD implies --rc; pass --version to build a nightly from it"
                    .to_string(),
            ],
            ReleaseError::Config(ConfigError::MissingTool { tool, .. }) => vec![
                format!("Install '{}' and make sure it is on PATH", tool),
                "Run with --debug to see the prerequisite report".to_string(),
            ],
            ReleaseError::Config(ConfigError::MissingArgument { argument }) => vec![format!(
                "Pass {} on the command line or set it in release.toml",
                argument
            )],
            ReleaseError::Version(VersionError::Unavailable { .. }) => vec![
                "Create a tag reachable from HEAD: git tag 1.0.0".to_string(),
                "Or pass an explicit version: --version=1.0.0".to_string(),
            ],
            ReleaseError::Target(TargetError::UnsupportedPlatform { supported, .. }) => vec![
                format!("Use one of: {}, or all", supported.join(", ")),
                "Declare the platform under [builds] in release.toml".to_string(),
            ],
            ReleaseError::Target(TargetError::UnsupportedArch {
                platform,
                supported,
                ..
            }) => vec![
                format!("Use one of: {}, or all", supported.join(", ")),
                format!("Declare the architecture under [builds].{} in release.toml", platform),
            ],
            ReleaseError::Tool(ToolError::SpawnFailed { .. }) => vec![
                "Check that the tool is installed and executable".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is a configuration problem detected before any work
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ReleaseError::Config(_) | ReleaseError::Target(_) | ReleaseError::Toml(_)
        )
    }
}
