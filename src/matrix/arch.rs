//! Architecture normalization.

use std::fmt;

/// A target architecture after alias normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    /// `x86_64` / `amd64`
    Amd64,
    /// `386` / `i386`
    I386,
    /// `arm`, `armv6l`, `armv7l`, ...
    Arm,
    /// `arm64` / `aarch64`
    Arm64,
    /// Anything else, carried verbatim
    Other(String),
}

impl Arch {
    /// Normalize an architecture name.
    ///
    /// Normalization is idempotent: parsing either rendering of an `Arch`
    /// yields the same `Arch`.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        match name {
            "x86_64" | "amd64" => Arch::Amd64,
            "386" | "i386" | "i686" | "x86" => Arch::I386,
            "arm64" | "aarch64" => Arch::Arm64,
            "arm" => Arch::Arm,
            other if other.starts_with("armv") => Arch::Arm,
            other => Arch::Other(other.to_string()),
        }
    }

    /// Name the compiler toolchain expects (`GOARCH`)
    pub fn toolchain_name(&self) -> &str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::I386 => "386",
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::Other(name) => name,
        }
    }

    /// Label used in output directories, archive names and package metadata
    pub fn package_label(&self) -> &str {
        match self {
            Arch::I386 => "i386",
            other => other.toolchain_name(),
        }
    }

    /// Whether the toolchain takes an ARM sub-version for this architecture
    pub fn is_arm(&self) -> bool {
        matches!(self, Arch::Arm)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.package_label())
    }
}

/// Platform name of the host in toolchain terms
pub fn host_platform() -> String {
    match std::env::consts::OS {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    }
}

/// Architecture of the host
pub fn host_arch() -> Arch {
    Arch::parse(std::env::consts::ARCH)
}
