//! `fpm` invocation and output parsing.

use super::PackageType;
use crate::metadata::ProjectConfig;
use crate::process::ToolCommand;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static OUTPUT_PATH: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r#":path=>"([^"]*)""#));

/// Per-package values of one `fpm` run
#[derive(Debug, Clone)]
pub(crate) struct FpmInvocation<'a> {
    pub package_type: PackageType,
    pub name: &'a str,
    pub arch: &'a str,
    pub version: &'a str,
    pub iteration: &'a str,
    pub root: &'a Path,
    pub output: &'a Path,
    pub verbose: bool,
}

/// Build the `fpm` command packaging `invocation.root`.
///
/// Script paths are relative to the source directory, which becomes the
/// working directory of the command.
pub(crate) fn fpm_command(
    project: &ProjectConfig,
    source_dir: &Path,
    invocation: &FpmInvocation<'_>,
) -> ToolCommand {
    let package = &project.package;
    let scripts = &project.scripts;
    let mut cmd = ToolCommand::new("fpm")
        .current_dir(source_dir)
        .args(["-f", "-s", "dir", "--log", "error"]);

    cmd = optional(cmd, "--vendor", &package.vendor);
    cmd = optional(cmd, "--url", &package.url);
    cmd = cmd
        .arg("--after-install")
        .arg(scripts.post_install.to_string_lossy());
    cmd = optional(cmd, "--license", &package.license);
    cmd = optional(cmd, "--maintainer", &package.maintainer);
    for dir in project.layout.package_directories() {
        cmd = cmd.arg("--directories").arg(dir.to_string_lossy());
    }
    cmd = optional(cmd, "--description", &package.description);
    cmd = cmd
        .arg("--after-remove")
        .arg(scripts.post_uninstall.to_string_lossy())
        .arg("--config-files")
        .arg(project.layout.logrotate_file().to_string_lossy());

    cmd = cmd
        .arg("--name")
        .arg(invocation.name)
        .arg("-a")
        .arg(invocation.arch)
        .arg("-t")
        .arg(invocation.package_type.short_name())
        .arg("--version")
        .arg(invocation.version)
        .arg("--iteration")
        .arg(invocation.iteration)
        .arg("-C")
        .arg(invocation.root.to_string_lossy())
        .arg("-p")
        .arg(invocation.output.to_string_lossy());

    if invocation.verbose {
        cmd = cmd.arg("--verbose");
    }

    match invocation.package_type {
        PackageType::Rpm => cmd
            .args(["--depends", "coreutils", "--rpm-posttrans"])
            .arg(scripts.post_install.to_string_lossy()),
        PackageType::OsxPkg => match &package.osx_identifier {
            Some(prefix) => cmd.arg("--osxpkg-identifier-prefix").arg(prefix),
            None => cmd,
        },
        _ => cmd,
    }
}

/// Append `flag value` when the metadata value is set
fn optional(cmd: ToolCommand, flag: &str, value: &Option<String>) -> ToolCommand {
    match value {
        Some(value) => cmd.arg(flag).arg(value),
        None => cmd,
    }
}

/// Extract the created package path from `fpm` output (`:path=>"..."`)
pub fn parse_output_path(output: &str) -> Option<PathBuf> {
    let re = OUTPUT_PATH.as_ref().ok()?;
    re.captures(output)
        .map(|caps| PathBuf::from(&caps[1]))
        .filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = r#"
[package]
name = "ossia"
vendor = "Adobe"
license = "Apache License 2.0"
description = "OpenStack Simple Inventory API"
"#;

    fn invocation(package_type: PackageType) -> FpmInvocation<'static> {
        FpmInvocation {
            package_type,
            name: "ossia",
            arch: "amd64",
            version: "1.2.0",
            iteration: "1",
            root: Path::new("/tmp/stage/linux/amd64/ossia-1.2.0-1"),
            output: Path::new("/src/build"),
            verbose: false,
        }
    }

    #[test]
    fn test_deb_command() {
        let project = ProjectConfig::from_toml(PROJECT, "ossia").unwrap();
        let cmd = fpm_command(&project, Path::new("/src"), &invocation(PackageType::Deb));
        assert_eq!(cmd.program, "fpm");
        assert_eq!(cmd.current_dir, Some(PathBuf::from("/src")));
        assert_eq!(&cmd.args[..5], &["-f", "-s", "dir", "--log", "error"]);
        assert_eq!(cmd.arg_after("--vendor"), Some("Adobe"));
        assert_eq!(cmd.arg_after("--license"), Some("Apache License 2.0"));
        assert_eq!(cmd.arg_after("--url"), None);
        assert_eq!(cmd.arg_after("--after-install"), Some("scripts/post-install.sh"));
        assert_eq!(cmd.arg_after("--after-remove"), Some("scripts/post-uninstall.sh"));
        assert_eq!(cmd.arg_after("--config-files"), Some("/etc/logrotate.d/ossia"));
        let dirs: Vec<_> = cmd
            .args
            .windows(2)
            .filter(|w| w[0] == "--directories")
            .map(|w| w[1].clone())
            .collect();
        assert_eq!(dirs, vec!["/opt/ossia/db", "/opt/ossia/log", "/opt/ossia/etc"]);
        assert_eq!(cmd.arg_after("-t"), Some("deb"));
        assert_eq!(cmd.arg_after("-C"), Some("/tmp/stage/linux/amd64/ossia-1.2.0-1"));
        assert_eq!(cmd.arg_after("-p"), Some("/src/build"));
        assert!(!cmd.args.contains(&"--depends".to_string()));
        assert!(!cmd.args.contains(&"--verbose".to_string()));
    }

    #[test]
    fn test_rpm_and_verbose_extras() {
        let project = ProjectConfig::from_toml(PROJECT, "ossia").unwrap();
        let mut inv = invocation(PackageType::Rpm);
        inv.verbose = true;
        let cmd = fpm_command(&project, Path::new("/src"), &inv);
        assert!(cmd.args.contains(&"--verbose".to_string()));
        assert_eq!(cmd.arg_after("--depends"), Some("coreutils"));
        assert_eq!(cmd.arg_after("--rpm-posttrans"), Some("scripts/post-install.sh"));
    }

    #[test]
    fn test_osxpkg_identifier() {
        let project = ProjectConfig::from_toml(
            "[package]\nosx_identifier = \"com.example\"\n[packages]\ndarwin = [\"osxpkg\"]\n",
            "ossia",
        )
        .unwrap();
        let cmd = fpm_command(&project, Path::new("/src"), &invocation(PackageType::OsxPkg));
        assert_eq!(cmd.arg_after("--osxpkg-identifier-prefix"), Some("com.example"));
    }

    #[test]
    fn test_parse_output_path() {
        let out = r#"{:timestamp=>"2024-03-01T12:00:00", :message=>"Created package", :path=>"build/ossia_1.2.0-1_amd64.deb"}"#;
        assert_eq!(
            parse_output_path(out),
            Some(PathBuf::from("build/ossia_1.2.0-1_amd64.deb"))
        );
        assert_eq!(parse_output_path("no package here"), None);
        assert_eq!(parse_output_path(r#":path=>"""#), None);
    }
}
