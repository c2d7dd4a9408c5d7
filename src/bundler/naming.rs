//! Artifact naming conventions.

use super::PackageType;
use crate::matrix::{Arch, BuildJob};
use crate::version::Version;
use std::path::{Path, PathBuf};

/// Name, package root and output location for one package format
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArtifactPlan {
    /// `--name` handed to the builder
    pub name: String,
    /// `-C` directory packaged by the builder
    pub root: PathBuf,
    /// `-p` output path (a directory for deb/rpm)
    pub output: PathBuf,
}

/// Decide how one format of one job is named and where it goes.
///
/// `build_root` is packaged directly by system package formats; archives are
/// rooted one level above it so they unpack into a versioned directory.
pub(crate) fn plan_artifact(
    package_type: PackageType,
    package_name: &str,
    version: &Version,
    job: &BuildJob,
    build_root: &Path,
    archive_root: &Path,
) -> ArtifactPlan {
    let arch = job.arch.package_label();
    let package_version = version.package_version();

    let archive_name = || {
        if version.is_nightly() {
            format!("{}-nightly_{}_{}", package_name, job.platform, arch)
        } else {
            format!(
                "{}-{}-{}_{}_{}",
                package_name,
                package_version,
                version.iteration(),
                job.platform,
                arch
            )
        }
    };

    match package_type {
        PackageType::Tar => {
            let name = archive_name();
            ArtifactPlan {
                output: job.output_dir.join(format!("{}.tar.gz", name)),
                name,
                root: archive_root.to_path_buf(),
            }
        }
        PackageType::Zip => {
            let name = archive_name();
            ArtifactPlan {
                output: job.output_dir.join(format!("{}.zip", name)),
                name,
                root: archive_root.to_path_buf(),
            }
        }
        PackageType::OsxPkg => {
            let name = format!("{}-{}_{}", package_name, package_version, arch);
            ArtifactPlan {
                output: job.output_dir.join(format!("{}.pkg", name)),
                name,
                root: build_root.to_path_buf(),
            }
        }
        PackageType::Deb | PackageType::Rpm => ArtifactPlan {
            name: package_name.to_string(),
            root: build_root.to_path_buf(),
            output: job.output_dir.clone(),
        },
    }
}

/// Architecture written into the package.
///
/// An explicit `--pkgarch` wins over the job architecture; `386` always
/// becomes `i386`.
pub fn package_arch_label(override_arch: Option<&str>, job_arch: &Arch) -> String {
    let label = override_arch.unwrap_or(job_arch.package_label());
    if label == "386" {
        "i386".to_string()
    } else {
        label.to_string()
    }
}

/// File name of a nightly system package with `<version>-<iteration>`
/// replaced by `nightly`.
pub fn nightly_file_name(file_name: &str, package_version: &str, iteration: u32) -> String {
    file_name.replace(&format!("{}-{}", package_version, iteration), "nightly")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(platform: &str, arch: Arch) -> BuildJob {
        BuildJob {
            platform: platform.to_string(),
            arch,
            output_dir: PathBuf::from("/out"),
        }
    }

    #[test]
    fn test_archive_names() {
        let release = Version::new("1.2.0", None, None, None).unwrap();
        let plan = plan_artifact(
            PackageType::Tar,
            "ossia",
            &release,
            &job("linux", Arch::Amd64),
            Path::new("/tmp/x/linux/amd64/ossia-1.2.0-1"),
            Path::new("/tmp/x/linux/amd64"),
        );
        assert_eq!(plan.name, "ossia-1.2.0-1_linux_amd64");
        assert_eq!(plan.output, PathBuf::from("/out/ossia-1.2.0-1_linux_amd64.tar.gz"));
        assert_eq!(plan.root, PathBuf::from("/tmp/x/linux/amd64"));

        let nightly = Version::new("1.2.0", None, Some(1_700_000_000), None).unwrap();
        let plan = plan_artifact(
            PackageType::Zip,
            "ossia",
            &nightly,
            &job("windows", Arch::I386),
            Path::new("/b"),
            Path::new("/a"),
        );
        assert_eq!(plan.name, "ossia-nightly_windows_i386");
        assert_eq!(plan.output, PathBuf::from("/out/ossia-nightly_windows_i386.zip"));
    }

    #[test]
    fn test_system_package_and_osxpkg_names() {
        let release = Version::new("1.2.0", Some(1), None, None).unwrap();
        let deb = plan_artifact(
            PackageType::Deb,
            "ossia",
            &release,
            &job("linux", Arch::Arm),
            Path::new("/root"),
            Path::new("/"),
        );
        assert_eq!(deb.name, "ossia");
        assert_eq!(deb.root, PathBuf::from("/root"));
        assert_eq!(deb.output, PathBuf::from("/out"));

        let pkg = plan_artifact(
            PackageType::OsxPkg,
            "ossia",
            &release,
            &job("darwin", Arch::Amd64),
            Path::new("/root"),
            Path::new("/"),
        );
        assert_eq!(pkg.output, PathBuf::from("/out/ossia-1.2.0_amd64.pkg"));
    }

    #[test]
    fn test_package_arch_label() {
        assert_eq!(package_arch_label(None, &Arch::I386), "i386");
        assert_eq!(package_arch_label(Some("armhf"), &Arch::Arm), "armhf");
        assert_eq!(package_arch_label(Some("386"), &Arch::Amd64), "i386");
        assert_eq!(package_arch_label(None, &Arch::Amd64), "amd64");
    }

    #[test]
    fn test_nightly_file_name() {
        assert_eq!(
            nightly_file_name("ossia_1.2.0.n1700000000-0_amd64.deb", "1.2.0.n1700000000", 0),
            "ossia_nightly_amd64.deb"
        );
        assert_eq!(
            nightly_file_name("ossia-1.2.0.n1700000000-0.x86_64.rpm", "1.2.0.n1700000000", 0),
            "ossia-nightly.x86_64.rpm"
        );
    }
}
