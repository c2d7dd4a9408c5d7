//! Version resolution from VCS state and command line overrides.

use super::Version;
use crate::error::{ConfigError, Result, VersionError};
use crate::git::GitOperations;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static RC_TAG: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(?P<base>.+)-rc(?P<rc>\d+)$"));

/// Version-related command line inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRequest {
    /// `--version`; when set the VCS tag is not consulted
    pub version: Option<String>,
    /// `--rc`
    pub release_candidate: Option<u32>,
    /// `--nightly`
    pub nightly: bool,
    /// `--iteration`
    pub iteration: Option<u32>,
}

impl VersionRequest {
    /// Reject combinations that are invalid before anything is queried
    pub fn validate(&self) -> Result<()> {
        if let (true, Some(rc)) = (self.nightly, self.release_candidate) {
            return Err(ConfigError::ConflictingFlags {
                flags: vec!["--nightly".to_string(), format!("--rc={}", rc)],
                reason: "a build cannot be both nightly and a release candidate".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Parse a non-negative integer option.
pub fn parse_number(name: &str, value: &str) -> Result<u32> {
    value.trim().parse::<u32>().map_err(|_| {
        VersionError::InvalidNumber {
            name: name.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

/// Split a VCS tag into its base version and release-candidate number.
///
/// A leading `v` before a digit is dropped: `v1.2.3-rc4` -> (`1.2.3`, `Some(4)`).
pub fn parse_tag(tag: &str) -> (String, Option<u32>) {
    let tag = tag.trim();
    let tag = match tag.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => tag,
    };

    if let Ok(re) = RC_TAG.as_ref()
        && let Some(caps) = re.captures(tag)
        && let Ok(rc) = caps["rc"].parse::<u32>()
    {
        return (caps["base"].to_string(), Some(rc));
    }

    (tag.to_string(), None)
}

/// Resolve the version of this run.
///
/// Without an explicit `--version` the most recent tag reachable from HEAD
/// supplies the base, and an `-rcN` suffix on it makes the run an implicit
/// release candidate unless `--rc` is given. `now` supplies the nightly epoch.
pub async fn resolve<G: GitOperations>(
    git: &G,
    request: &VersionRequest,
    now: DateTime<Utc>,
) -> Result<Version> {
    request.validate()?;

    let (base, tag_rc) = match &request.version {
        Some(explicit) => (explicit.trim().to_string(), None),
        None => {
            let tag = git.current_version_tag().await?;
            let (base, rc) = parse_tag(&tag);
            if let Some(rc) = rc {
                log::info!("Tag '{}' marks release candidate {}", tag.trim(), rc);
            }
            (base, rc)
        }
    };

    if base.is_empty() {
        return Err(VersionError::Unavailable {
            reason: "resolved version is empty".to_string(),
        }
        .into());
    }

    let release_candidate = request.release_candidate.or(tag_rc);
    let nightly_epoch = request.nightly.then(|| now.timestamp());

    Version::new(base, release_candidate, nightly_epoch, request.iteration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;

    struct FixedTag {
        tag: Option<&'static str>,
        queried: Cell<bool>,
    }

    impl FixedTag {
        fn new(tag: Option<&'static str>) -> Self {
            Self {
                tag,
                queried: Cell::new(false),
            }
        }
    }

    impl GitOperations for FixedTag {
        async fn current_version_tag(&self) -> Result<String> {
            self.queried.set(true);
            self.tag.map(str::to_string).ok_or_else(|| {
                VersionError::Unavailable {
                    reason: "fatal: No names found".to_string(),
                }
                .into()
            })
        }

        async fn current_commit(&self, short: bool) -> Result<String> {
            Ok(if short { "abc1234" } else { "abc1234def" }.to_string())
        }

        async fn current_branch(&self) -> Result<String> {
            Ok("master".to_string())
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag("1.2.3"), ("1.2.3".to_string(), None));
        assert_eq!(parse_tag("v1.2.3-rc4\n"), ("1.2.3".to_string(), Some(4)));
        assert_eq!(parse_tag("version-1"), ("version-1".to_string(), None));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("--rc", "2").unwrap(), 2);
        assert!(parse_number("--rc", "-1").is_err());
        assert!(parse_number("--iteration", "two").is_err());
    }

    #[tokio::test]
    async fn test_tag_supplies_base() {
        let git = FixedTag::new(Some("1.4.0"));
        let v = resolve(&git, &VersionRequest::default(), at(0)).await.unwrap();
        assert_eq!(v.embedded(), "1.4.0");
        assert_eq!(v.iteration(), 1);
    }

    #[tokio::test]
    async fn test_rc_tag_is_implicit_release_candidate() {
        let git = FixedTag::new(Some("v1.2.3-rc4"));
        let v = resolve(&git, &VersionRequest::default(), at(0)).await.unwrap();
        assert_eq!(v.base(), "1.2.3");
        assert_eq!(v.release_candidate(), Some(4));
        assert_eq!(v.iteration(), 0);
        assert_eq!(v.package_iteration(), "0.rc4");
    }

    #[tokio::test]
    async fn test_explicit_rc_supersedes_tag() {
        let git = FixedTag::new(Some("1.2.3-rc4"));
        let request = VersionRequest {
            release_candidate: Some(6),
            ..Default::default()
        };
        let v = resolve(&git, &request, at(0)).await.unwrap();
        assert_eq!(v.embedded(), "1.2.3rc6");
    }

    #[tokio::test]
    async fn test_explicit_version_skips_vcs() {
        let git = FixedTag::new(None);
        let request = VersionRequest {
            version: Some("2.0.0".to_string()),
            ..Default::default()
        };
        let v = resolve(&git, &request, at(0)).await.unwrap();
        assert_eq!(v.embedded(), "2.0.0");
        assert!(!git.queried.get());
    }

    #[tokio::test]
    async fn test_vcs_failure_is_version_unavailable() {
        let git = FixedTag::new(None);
        let err = resolve(&git, &VersionRequest::default(), at(0)).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Version(VersionError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_nightly_and_explicit_rc_rejected_before_vcs() {
        let git = FixedTag::new(Some("1.0.0"));
        let request = VersionRequest {
            version: Some("1.0".to_string()),
            release_candidate: Some(1),
            nightly: true,
            ..Default::default()
        };
        let err = resolve(&git, &request, at(0)).await.unwrap_err();
        assert!(err.is_configuration_error());
        assert!(!git.queried.get());
    }

    #[tokio::test]
    async fn test_nightly_with_rc_tag_conflicts() {
        let git = FixedTag::new(Some("1.0.0-rc2"));
        let request = VersionRequest {
            nightly: true,
            ..Default::default()
        };
        let err = resolve(&git, &request, at(0)).await.unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[tokio::test]
    async fn test_nightly_versions_increase_with_time() {
        let git = FixedTag::new(Some("1.0.0"));
        let request = VersionRequest {
            nightly: true,
            ..Default::default()
        };
        let earlier = resolve(&git, &request, at(1_700_000_000)).await.unwrap();
        let later = resolve(&git, &request, at(1_700_086_400)).await.unwrap();
        assert_eq!(earlier.iteration(), 0);
        assert!(later.package_version() > earlier.package_version());
        assert!(later.embedded() > earlier.embedded());
    }

    #[tokio::test]
    async fn test_iteration_override() {
        let git = FixedTag::new(Some("1.0.0-rc1"));
        let request = VersionRequest {
            iteration: Some(3),
            ..Default::default()
        };
        let v = resolve(&git, &request, at(0)).await.unwrap();
        assert_eq!(v.iteration(), 3);
    }
}
