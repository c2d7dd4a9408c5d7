//! Package assembly for compiled build outputs.
//!
//! For every (platform, architecture) in a [`BuildOutput`](crate::matrix::BuildOutput)
//! the bundler stages an install tree in a temporary directory, copies the
//! service scripts, renders sample configuration, copies the binaries and
//! hands the tree to `fpm` once per package format declared for the platform.
//!
//! # Supported Formats
//!
//! | Format | Output | Notes |
//! |--------|--------|-------|
//! | `deb` | builder-native name | renamed to `nightly` for nightly builds |
//! | `rpm` | builder-native name | adds a `coreutils` dependency and post-transaction hook |
//! | `tar` | `<name>.tar.gz` | rooted one level above the build root |
//! | `zip` | `<name>.zip` | rooted one level above the build root |
//! | `osxpkg` | `<name>-<version>_<arch>.pkg` | needs `package.osx_identifier` |
//!
//! # Layout
//!
//! Packages install under the configured root directory:
//!
//! ```text
//! /opt/<name>/bin       binaries
//! /opt/<name>/db        data (declared as package directory)
//! /opt/<name>/log       logs (declared as package directory)
//! /opt/<name>/etc       rendered sample configs (declared as package directory)
//! /opt/<name>/scripts   init, upstart and systemd scripts
//! /etc/logrotate.d/<name>
//! ```

#![warn(missing_docs)]

mod builder;
mod error;
mod fpm;
mod naming;
mod staging;
mod utils;

pub use builder::Bundler;
pub use error::{Context, Error, ErrorExt, Result};
pub use fpm::parse_output_path;
pub use naming::{nightly_file_name, package_arch_label};

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Supported package formats.
///
/// Each format maps to one `fpm` output type.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    /// Gzipped tarball (.tar.gz).
    Tar,

    /// ZIP archive (.zip).
    Zip,

    /// Debian package (.deb).
    Deb,

    /// RPM package (.rpm).
    Rpm,

    /// macOS installer package (.pkg).
    OsxPkg,
}

impl PackageType {
    /// Returns the short name for this package type.
    ///
    /// This is the `fpm` output type and the identifier used in `release.toml`.
    pub fn short_name(&self) -> &'static str {
        match self {
            PackageType::Tar => "tar",
            PackageType::Zip => "zip",
            PackageType::Deb => "deb",
            PackageType::Rpm => "rpm",
            PackageType::OsxPkg => "osxpkg",
        }
    }

    /// Whether the format is a plain archive rather than a system package.
    pub fn is_archive(&self) -> bool {
        matches!(self, PackageType::Tar | PackageType::Zip)
    }

    /// Every supported format
    pub fn all() -> &'static [PackageType] {
        &[
            PackageType::Tar,
            PackageType::Zip,
            PackageType::Deb,
            PackageType::Rpm,
            PackageType::OsxPkg,
        ]
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for PackageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PackageType::all()
            .iter()
            .copied()
            .find(|t| t.short_name() == s)
            .ok_or_else(|| Error::GenericError(format!("unknown package type '{}'", s)))
    }
}

/// A package produced by the bundler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Format of the package
    pub package_type: PackageType,

    /// Name handed to the package builder
    pub name: String,

    /// Final location of the package file
    pub path: PathBuf,

    /// Target platform
    pub platform: String,

    /// Architecture label written into the package
    pub package_arch: String,

    /// Package iteration (`1`, `0`, `0.rc2`, ...)
    pub iteration: String,

    /// Size of the package file in bytes
    pub size: u64,

    /// MD5 digest of the package file, lowercase hex
    pub md5: String,
}
