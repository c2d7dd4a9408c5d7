//! # release_matrix
//!
//! Release engineering for Go services: resolve a version from VCS state,
//! cross-compile across a platform/architecture matrix, assemble system
//! packages and archives with `fpm`, and publish them to S3.
//!
//! ## Features
//!
//! - **Version resolution**: tags, release candidates, nightly epochs and iterations
//! - **Build matrix**: `all` selectors, architecture aliases, per-job output directories
//! - **Packaging**: staged install trees, rendered sample configs, MD5 digests
//! - **Publishing**: duplicate-avoiding uploads, nightlies always overwrite
//!
//! ## Usage
//!
//! ```bash
//! release_matrix --platform=linux --arch=all --package
//! release_matrix --nightly --platform=all --arch=all --package --upload
//! release_matrix --test --race --timeout=480s
//! ```
//!
//! Every external tool is reached through [`process::CommandRunner`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod bundler;
pub mod cli;
pub mod error;
pub mod git;
pub mod matrix;
pub mod metadata;
pub mod preflight;
pub mod process;
pub mod publish;
pub mod toolchain;
pub mod version;

// Re-export main types for public API
pub use bundler::{Bundler, Package, PackageType};
pub use cli::Args;
pub use error::{ReleaseError, Result};
pub use git::{GitCli, GitOperations};
pub use matrix::{Arch, BuildJob, BuildOutput};
pub use metadata::ProjectConfig;
pub use process::{CommandRunner, SystemRunner};
pub use publish::{UploadOutcome, UploadTarget, Uploader};
pub use version::Version;
