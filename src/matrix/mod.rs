//! Build matrix planning.
//!
//! Expands platform and architecture selectors against the supported-builds
//! table into an ordered list of [`BuildJob`]s, and records finished jobs in a
//! [`BuildOutput`] for the packaging stage.

mod arch;
mod output;

pub use arch::{Arch, host_arch, host_platform};
pub use output::BuildOutput;

use crate::error::TargetError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Selector value expanding to every supported platform or architecture
pub const ALL: &str = "all";

/// One concrete (platform, architecture) compilation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    /// Target platform (`linux`, `darwin`, `windows`, ...)
    pub platform: String,
    /// Normalized target architecture
    pub arch: Arch,
    /// Directory receiving the compiled binaries
    pub output_dir: PathBuf,
}

impl BuildJob {
    /// File name of a target binary on this platform
    pub fn binary_name(&self, target: &str) -> String {
        if self.platform == "windows" {
            format!("{}.exe", target)
        } else {
            target.to_string()
        }
    }
}

/// Expand the selectors into ordered build jobs.
///
/// Platforms are visited in table order (sorted), architectures in declared
/// order. When more than one job results, each job writes to
/// `<outdir>/<platform>/<arch label>`; a single job writes to `outdir`.
pub fn plan(
    platform: &str,
    arch: &str,
    supported: &BTreeMap<String, Vec<String>>,
    outdir: &Path,
) -> std::result::Result<Vec<BuildJob>, TargetError> {
    let supported_platforms = || supported.keys().cloned().collect::<Vec<_>>();

    let platforms: Vec<&String> = if platform == ALL {
        supported.keys().collect()
    } else {
        let (key, _) = supported.get_key_value(platform).ok_or_else(|| {
            TargetError::UnsupportedPlatform {
                platform: platform.to_string(),
                supported: supported_platforms(),
            }
        })?;
        vec![key]
    };

    let mut pairs = Vec::new();
    for platform in platforms {
        let declared: Vec<Arch> = supported
            .get(platform)
            .map(|archs| archs.iter().map(|a| Arch::parse(a)).collect())
            .unwrap_or_default();

        if arch == ALL {
            for a in declared {
                pairs.push((platform.clone(), a));
            }
            continue;
        }

        let requested = Arch::parse(arch);
        if !declared.contains(&requested) {
            return Err(TargetError::UnsupportedArch {
                platform: platform.clone(),
                arch: arch.to_string(),
                supported: declared.iter().map(|a| a.package_label().to_string()).collect(),
            });
        }
        pairs.push((platform.clone(), requested));
    }

    let namespaced = pairs.len() > 1;
    Ok(pairs
        .into_iter()
        .map(|(platform, arch)| {
            let output_dir = if namespaced {
                outdir.join(&platform).join(arch.package_label())
            } else {
                outdir.to_path_buf()
            };
            BuildJob {
                platform,
                arch,
                output_dir,
            }
        })
        .collect())
}
