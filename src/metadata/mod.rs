//! Project release description loaded from `release.toml`.
//!
//! The file is optional. Every value has a default derived from the package
//! name, which itself defaults to the name of the source directory.

use crate::bundler::PackageType;
use crate::error::{ConfigError, ReleaseError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the release description looked up in the source directory
pub const CONFIG_FILE_NAME: &str = "release.toml";

/// Package metadata handed to the package builder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Package name
    pub name: String,
    /// Vendor (`--vendor`)
    pub vendor: Option<String>,
    /// Homepage (`--url`)
    pub url: Option<String>,
    /// License text (`--license`)
    pub license: Option<String>,
    /// Maintainer contact (`--maintainer`)
    pub maintainer: Option<String>,
    /// Description (`--description`)
    pub description: Option<String>,
    /// Identifier prefix for macOS installer packages
    pub osx_identifier: Option<String>,
}

/// Install layout of the packaged application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    /// Root of the installation, e.g. `/opt/ossia`
    pub root_dir: PathBuf,
    /// Directory holding the log-rotation rules, e.g. `/etc/logrotate.d`
    pub logrotate_dir: PathBuf,
    package_name: String,
}

impl InstallLayout {
    /// Layout rooted at `root_dir`
    pub fn new(
        root_dir: impl Into<PathBuf>,
        logrotate_dir: impl Into<PathBuf>,
        package_name: impl Into<String>,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            logrotate_dir: logrotate_dir.into(),
            package_name: package_name.into(),
        }
    }

    /// Binary directory
    pub fn bin_dir(&self) -> PathBuf {
        self.root_dir.join("bin")
    }

    /// Database directory
    pub fn db_dir(&self) -> PathBuf {
        self.root_dir.join("db")
    }

    /// Log directory
    pub fn log_dir(&self) -> PathBuf {
        self.root_dir.join("log")
    }

    /// Configuration directory
    pub fn config_dir(&self) -> PathBuf {
        self.root_dir.join("etc")
    }

    /// Service script directory
    pub fn script_dir(&self) -> PathBuf {
        self.root_dir.join("scripts")
    }

    /// Installed log-rotation rule
    pub fn logrotate_file(&self) -> PathBuf {
        self.logrotate_dir.join(&self.package_name)
    }

    /// Every directory the staged tree must contain, in creation order
    pub fn directories(&self) -> Vec<PathBuf> {
        vec![
            self.root_dir.clone(),
            self.bin_dir(),
            self.db_dir(),
            self.log_dir(),
            self.config_dir(),
            self.script_dir(),
            self.logrotate_dir.clone(),
        ]
    }

    /// Directories declared as owned by the package
    pub fn package_directories(&self) -> Vec<PathBuf> {
        vec![self.db_dir(), self.log_dir(), self.config_dir()]
    }
}

/// Locate `path` (absolute, inside the install layout) under a staging root.
pub fn staged_path(staging_root: &Path, path: &Path) -> PathBuf {
    let relative = path.strip_prefix("/").unwrap_or(path);
    staging_root.join(relative)
}

/// Auxiliary scripts shipped in the package, relative to the source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSet {
    /// SysV init script
    pub init: PathBuf,
    /// Upstart job
    pub upstart: PathBuf,
    /// systemd unit
    pub systemd: PathBuf,
    /// Post-install hook (`--after-install`, rpm `--rpm-posttrans`)
    pub post_install: PathBuf,
    /// Post-uninstall hook (`--after-remove`)
    pub post_uninstall: PathBuf,
    /// Log-rotation rule
    pub logrotate: PathBuf,
    /// Sample configuration templates (`*.example`)
    pub app_configs: Vec<PathBuf>,
}

/// Tools checked before any work starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerequisites {
    /// Tools whose absence aborts the run
    pub required: Vec<String>,
    /// Tools only reported
    pub optional: Vec<String>,
}

/// Fully resolved project release description.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Package metadata
    pub package: PackageMetadata,
    /// Install layout
    pub layout: InstallLayout,
    /// Shipped scripts and sample configs
    pub scripts: ScriptSet,
    /// Binary name -> entry module
    pub targets: BTreeMap<String, String>,
    /// Platform -> architectures, in declared order
    pub builds: BTreeMap<String, Vec<String>>,
    /// Platform -> package formats, in declared order
    pub packages: BTreeMap<String, Vec<PackageType>>,
    /// Prerequisite tools
    pub prerequisites: Prerequisites,
    /// Default upload bucket (`bucket[/prefix]`)
    pub upload_bucket: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    package: RawPackage,
    layout: RawLayout,
    scripts: RawScripts,
    targets: Option<BTreeMap<String, String>>,
    builds: Option<BTreeMap<String, Vec<String>>>,
    packages: Option<BTreeMap<String, Vec<PackageType>>>,
    prerequisites: RawPrerequisites,
    upload: RawUpload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawPackage {
    name: Option<String>,
    vendor: Option<String>,
    url: Option<String>,
    license: Option<String>,
    maintainer: Option<String>,
    description: Option<String>,
    osx_identifier: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawLayout {
    root_dir: Option<PathBuf>,
    logrotate_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawScripts {
    init: Option<PathBuf>,
    upstart: Option<PathBuf>,
    systemd: Option<PathBuf>,
    post_install: Option<PathBuf>,
    post_uninstall: Option<PathBuf>,
    logrotate: Option<PathBuf>,
    app_configs: Option<Vec<PathBuf>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawPrerequisites {
    required: Option<Vec<String>>,
    optional: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawUpload {
    bucket: Option<String>,
}

impl ProjectConfig {
    /// Load the release description for `source_dir`.
    ///
    /// An explicit `config_path` must exist; the default `release.toml` may be
    /// absent, in which case every value takes its default.
    pub fn load(source_dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| source_dir.join(CONFIG_FILE_NAME));

        let raw = if path.is_file() {
            let manifest = std::fs::read_to_string(&path).map_err(|e| {
                ReleaseError::Config(ConfigError::InvalidConfigFile {
                    path: path.clone(),
                    reason: format!("failed to read: {}", e),
                })
            })?;
            toml::from_str::<RawConfig>(&manifest).map_err(|e| {
                ReleaseError::Config(ConfigError::InvalidConfigFile {
                    path: path.clone(),
                    reason: e.to_string(),
                })
            })?
        } else if config_path.is_some() {
            return Err(ConfigError::InvalidConfigFile {
                path,
                reason: "file does not exist".to_string(),
            }
            .into());
        } else {
            log::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, source_dir.display());
            RawConfig::default()
        };

        let fallback_name = directory_name(source_dir);
        Self::resolve(raw, fallback_name)
    }

    /// Parse a release description from a string (used for tests and tooling)
    pub fn from_toml(manifest: &str, fallback_name: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(manifest)?;
        Self::resolve(raw, Some(fallback_name.to_string()))
    }

    fn resolve(raw: RawConfig, fallback_name: Option<String>) -> Result<Self> {
        let name = raw
            .package
            .name
            .or(fallback_name)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingArgument {
                argument: "package.name".to_string(),
            })?;

        if name.contains('/') || name.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                name: "package.name".to_string(),
                value: name,
                reason: "must not contain '/' or whitespace".to_string(),
            }
            .into());
        }

        let root_dir = raw
            .layout
            .root_dir
            .unwrap_or_else(|| PathBuf::from(format!("/opt/{}", name)));
        let logrotate_dir = raw
            .layout
            .logrotate_dir
            .unwrap_or_else(|| PathBuf::from("/etc/logrotate.d"));
        for (key, dir) in [("layout.root_dir", &root_dir), ("layout.logrotate_dir", &logrotate_dir)] {
            if !dir.is_absolute() || dir == Path::new("/") {
                return Err(ConfigError::InvalidValue {
                    name: key.to_string(),
                    value: dir.display().to_string(),
                    reason: "must be an absolute path below /".to_string(),
                }
                .into());
            }
        }

        let scripts = ScriptSet {
            init: raw.scripts.init.unwrap_or_else(|| "scripts/init.sh".into()),
            upstart: raw
                .scripts
                .upstart
                .unwrap_or_else(|| format!("scripts/{}.conf", name).into()),
            systemd: raw
                .scripts
                .systemd
                .unwrap_or_else(|| format!("scripts/{}.service", name).into()),
            post_install: raw
                .scripts
                .post_install
                .unwrap_or_else(|| "scripts/post-install.sh".into()),
            post_uninstall: raw
                .scripts
                .post_uninstall
                .unwrap_or_else(|| "scripts/post-uninstall.sh".into()),
            logrotate: raw
                .scripts
                .logrotate
                .unwrap_or_else(|| "scripts/logrotate".into()),
            app_configs: raw
                .scripts
                .app_configs
                .unwrap_or_else(|| vec!["etc/conf.yml.example".into()]),
        };

        let targets = raw
            .targets
            .unwrap_or_else(|| BTreeMap::from([(name.clone(), "main.go".to_string())]));
        if targets.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "targets".to_string(),
                value: "{}".to_string(),
                reason: "at least one build target is required".to_string(),
            }
            .into());
        }

        let builds = raw.builds.unwrap_or_else(|| {
            BTreeMap::from([(
                "linux".to_string(),
                vec!["amd64".to_string(), "arm".to_string()],
            )])
        });
        let packages = raw.packages.unwrap_or_else(|| {
            BTreeMap::from([(
                "linux".to_string(),
                vec![PackageType::Deb, PackageType::Rpm],
            )])
        });

        let wants_osxpkg = packages
            .values()
            .any(|formats| formats.contains(&PackageType::OsxPkg));
        if wants_osxpkg && raw.package.osx_identifier.is_none() {
            return Err(ConfigError::MissingArgument {
                argument: "package.osx_identifier".to_string(),
            }
            .into());
        }

        let prerequisites = Prerequisites {
            required: raw
                .prerequisites
                .required
                .unwrap_or_else(|| vec!["git".to_string(), "go".to_string()]),
            optional: raw
                .prerequisites
                .optional
                .unwrap_or_else(|| vec!["fpm".to_string(), "rpmbuild".to_string()]),
        };

        Ok(ProjectConfig {
            layout: InstallLayout::new(root_dir, logrotate_dir, name.clone()),
            package: PackageMetadata {
                name,
                vendor: raw.package.vendor,
                url: raw.package.url,
                license: raw.package.license,
                maintainer: raw.package.maintainer,
                description: raw.package.description,
                osx_identifier: raw.package.osx_identifier,
            },
            scripts,
            targets,
            builds,
            packages,
            prerequisites,
            upload_bucket: raw.upload.bucket,
        })
    }

    /// Package name
    pub fn name(&self) -> &str {
        &self.package.name
    }
}

fn directory_name(dir: &Path) -> Option<String> {
    std::fs::canonicalize(dir)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
}
