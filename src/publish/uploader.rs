//! Upload loop with duplicate avoidance.

use super::{ObjectStore, UploadOutcome, UploadTarget};
use crate::bundler::Package;
use crate::cli::RuntimeConfig;
use crate::error::Result;

/// Publishes packages to an [`ObjectStore`].
pub struct Uploader<S> {
    store: S,
}

impl<S: ObjectStore> Uploader<S> {
    /// Create an uploader writing to `store`
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Upload every package in order.
    ///
    /// A key that already exists is skipped unless `nightly` is set. Every
    /// written object is marked public. Store failures abort the loop.
    pub async fn upload_packages(
        &self,
        packages: &[Package],
        bucket_id: &str,
        nightly: bool,
        config: &RuntimeConfig,
    ) -> Result<Vec<UploadOutcome>> {
        config.section("Uploading");
        let mut outcomes = Vec::with_capacity(packages.len());

        for package in packages {
            let target = UploadTarget::for_file(bucket_id, &package.path)?;

            if !nightly && self.store.exists(&target).await? {
                config.indent(&format!("Skipping {} (already uploaded to {})", package.path.display(), target));
                outcomes.push(UploadOutcome::Skipped(target));
                continue;
            }

            config.println(&format!("Uploading {} to {}", package.path.display(), target));
            self.store.upload(&package.path, &target).await?;
            self.store.make_public(&target).await?;
            config.indent(&format!("Uploaded: {} ({} bytes)", target, package.size));
            outcomes.push(UploadOutcome::Uploaded(target));
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::PackageType;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    #[derive(Default)]
    struct MemoryStore {
        objects: RefCell<HashSet<String>>,
        writes: RefCell<usize>,
        public: RefCell<Vec<String>>,
    }

    impl ObjectStore for &MemoryStore {
        async fn exists(&self, target: &UploadTarget) -> Result<bool> {
            Ok(self.objects.borrow().contains(&target.to_string()))
        }

        async fn upload(&self, _file: &Path, target: &UploadTarget) -> Result<()> {
            *self.writes.borrow_mut() += 1;
            self.objects.borrow_mut().insert(target.to_string());
            Ok(())
        }

        async fn make_public(&self, target: &UploadTarget) -> Result<()> {
            self.public.borrow_mut().push(target.to_string());
            Ok(())
        }
    }

    fn package(file: &str) -> Package {
        Package {
            package_type: PackageType::Deb,
            name: "ossia".to_string(),
            path: PathBuf::from("/out").join(file),
            platform: "linux".to_string(),
            package_arch: "amd64".to_string(),
            iteration: "1".to_string(),
            size: 42,
            md5: "00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_release_reupload_writes_nothing() {
        let store = MemoryStore::default();
        let uploader = Uploader::new(&store);
        let packages = [package("ossia_1.0-1_amd64.deb")];
        let config = RuntimeConfig::new(false);

        let first = uploader.upload_packages(&packages, "b/rel", false, &config).await.unwrap();
        assert!(matches!(first[0], UploadOutcome::Uploaded(_)));
        assert_eq!(*store.writes.borrow(), 1);

        let second = uploader.upload_packages(&packages, "b/rel", false, &config).await.unwrap();
        assert!(matches!(second[0], UploadOutcome::Skipped(_)));
        assert_eq!(second[0].target().key, "rel/ossia_1.0-1_amd64.deb");
        assert_eq!(*store.writes.borrow(), 1);
        assert_eq!(store.public.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_nightly_always_overwrites() {
        let store = MemoryStore::default();
        store.objects.borrow_mut().insert("s3://b/ossia_nightly_amd64.deb".to_string());
        let uploader = Uploader::new(&store);

        let outcomes = uploader
            .upload_packages(
                &[package("ossia_nightly_amd64.deb")],
                "b",
                true,
                &RuntimeConfig::new(false),
            )
            .await
            .unwrap();

        assert!(matches!(outcomes[0], UploadOutcome::Uploaded(_)));
        assert_eq!(*store.writes.borrow(), 1);
        assert_eq!(store.public.borrow()[0], "s3://b/ossia_nightly_amd64.deb");
    }
}
