//! Artifact publishing to a remote object store.
//!
//! Packages are uploaded under a key derived from the bucket identifier and
//! the package file name. Release artifacts are never overwritten; nightly
//! artifacts always are.

mod object_store;
mod uploader;

pub use object_store::{AwsCliStore, ObjectStore};
pub use uploader::Uploader;

use crate::error::{ConfigError, Result};
use std::fmt;
use std::path::Path;

/// Location of one object in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Bucket name
    pub bucket: String,
    /// Object key inside the bucket
    pub key: String,
}

impl UploadTarget {
    /// Target for `file` under the bucket identifier `bucket[/nested/prefix]`.
    ///
    /// The bucket is the first path segment; the key is the file's base name,
    /// prefixed with the remaining segments when there are any.
    pub fn for_file(bucket_id: &str, file: &Path) -> Result<Self> {
        let trimmed = bucket_id.trim_matches('/');
        let (bucket, prefix) = match trimmed.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix.trim_matches('/')),
            None => (trimmed, ""),
        };
        if bucket.is_empty() {
            return Err(ConfigError::MissingArgument {
                argument: "--bucket".to_string(),
            }
            .into());
        }

        let base_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ConfigError::InvalidValue {
                name: "package path".to_string(),
                value: file.display().to_string(),
                reason: "has no file name".to_string(),
            })?;

        let key = if prefix.is_empty() {
            base_name
        } else {
            format!("{}/{}", prefix, base_name)
        };

        Ok(Self {
            bucket: bucket.to_string(),
            key,
        })
    }
}

impl fmt::Display for UploadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// What happened to one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Written to the store and marked public
    Uploaded(UploadTarget),
    /// Already present; left untouched
    Skipped(UploadTarget),
}

impl UploadOutcome {
    /// Target of the outcome
    pub fn target(&self) -> &UploadTarget {
        match self {
            UploadOutcome::Uploaded(target) | UploadOutcome::Skipped(target) => target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_with_nested_prefix() {
        let target = UploadTarget::for_file("b/x/y", Path::new("/out/ossia_1.0_amd64.deb")).unwrap();
        assert_eq!(target.bucket, "b");
        assert_eq!(target.key, "x/y/ossia_1.0_amd64.deb");
        assert_eq!(target.to_string(), "s3://b/x/y/ossia_1.0_amd64.deb");
    }

    #[test]
    fn test_bare_bucket_and_trailing_slash() {
        let target = UploadTarget::for_file("b", Path::new("pkg.rpm")).unwrap();
        assert_eq!((target.bucket.as_str(), target.key.as_str()), ("b", "pkg.rpm"));

        let target = UploadTarget::for_file("b/nightly/", Path::new("pkg.rpm")).unwrap();
        assert_eq!(target.key, "nightly/pkg.rpm");
    }

    #[test]
    fn test_empty_bucket_is_missing_argument() {
        let err = UploadTarget::for_file("/", Path::new("pkg.rpm")).unwrap_err();
        assert!(err.is_configuration_error());
    }
}
