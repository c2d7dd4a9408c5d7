//! Version identity of a build.
//!
//! A [`Version`] is resolved once per run from VCS state and command line
//! overrides and never changes afterwards.

mod resolver;

pub use resolver::{VersionRequest, parse_number, parse_tag, resolve};

use crate::error::{ConfigError, Result};
use std::fmt;

/// Resolved version of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    base: String,
    release_candidate: Option<u32>,
    nightly_epoch: Option<i64>,
    iteration: u32,
}

impl Version {
    /// Create a version.
    ///
    /// The iteration defaults to 0 for release candidates and nightlies and to
    /// 1 otherwise; `iteration` overrides it. A version cannot be both a
    /// release candidate and a nightly.
    pub fn new(
        base: impl Into<String>,
        release_candidate: Option<u32>,
        nightly_epoch: Option<i64>,
        iteration: Option<u32>,
    ) -> Result<Self> {
        if let (Some(rc), Some(_)) = (release_candidate, nightly_epoch) {
            return Err(ConfigError::ConflictingFlags {
                flags: vec!["--nightly".to_string(), format!("--rc={}", rc)],
                reason: "a build cannot be both nightly and a release candidate".to_string(),
            }
            .into());
        }

        let sentinel = if release_candidate.is_some() || nightly_epoch.is_some() {
            0
        } else {
            1
        };

        Ok(Self {
            base: base.into(),
            release_candidate,
            nightly_epoch,
            iteration: iteration.unwrap_or(sentinel),
        })
    }

    /// Base version without RC or nightly decoration
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Release candidate number, if any
    pub fn release_candidate(&self) -> Option<u32> {
        self.release_candidate
    }

    /// Nightly epoch seconds, if any
    pub fn nightly_epoch(&self) -> Option<i64> {
        self.nightly_epoch
    }

    /// Whether this is a nightly build
    pub fn is_nightly(&self) -> bool {
        self.nightly_epoch.is_some()
    }

    /// Package iteration counter
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Version string embedded in the binary (`1.2.0`, `1.2.0rc3`, `1.2.0.n1700000000`)
    pub fn embedded(&self) -> String {
        match self.release_candidate {
            Some(rc) => format!("{}rc{}", self.base, rc),
            None => self.package_version(),
        }
    }

    /// Version string handed to the package builder
    pub fn package_version(&self) -> String {
        match self.nightly_epoch {
            Some(epoch) => format!("{}.n{}", self.base, epoch),
            None => self.base.clone(),
        }
    }

    /// Iteration string handed to the package builder (`0.rc3` for RCs)
    pub fn package_iteration(&self) -> String {
        match self.release_candidate {
            Some(rc) => format!("0.rc{}", rc),
            None => self.iteration.to_string(),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.embedded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_release() {
        let v = Version::new("1.2.0", None, None, None).unwrap();
        assert_eq!(v.iteration(), 1);
        assert_eq!(v.embedded(), "1.2.0");
        assert_eq!(v.package_version(), "1.2.0");
        assert_eq!(v.package_iteration(), "1");
    }

    #[test]
    fn test_release_candidate_renderings() {
        let v = Version::new("1.2.0", Some(3), None, None).unwrap();
        assert_eq!(v.iteration(), 0);
        assert_eq!(v.embedded(), "1.2.0rc3");
        assert_eq!(v.package_version(), "1.2.0");
        assert_eq!(v.package_iteration(), "0.rc3");
    }

    #[test]
    fn test_nightly_renderings() {
        let v = Version::new("1.2.0", None, Some(1_700_000_000), None).unwrap();
        assert!(v.is_nightly());
        assert_eq!(v.iteration(), 0);
        assert_eq!(v.embedded(), "1.2.0.n1700000000");
        assert_eq!(v.package_version(), "1.2.0.n1700000000");
        assert_eq!(v.package_iteration(), "0");
    }

    #[test]
    fn test_iteration_override_wins() {
        let v = Version::new("1.2.0", None, Some(1_700_000_000), Some(4)).unwrap();
        assert_eq!(v.iteration(), 4);
        let v = Version::new("1.2.0", None, None, Some(7)).unwrap();
        assert_eq!(v.package_iteration(), "7");
    }

    #[test]
    fn test_nightly_and_rc_conflict() {
        let err = Version::new("1.2.0", Some(1), Some(1_700_000_000), None).unwrap_err();
        assert!(err.is_configuration_error());
    }
}
