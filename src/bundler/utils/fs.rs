//! File system utilities for bundling.
//!
//! Provides file operations with automatic directory creation, permission
//! handling and path-carrying errors.

use crate::bail;
use crate::bundler::error::{Error, ErrorExt, Result};
use std::path::Path;
use tokio::fs;

/// Creates all of the directories of the specified path with the given mode.
pub async fn create_dir_all(path: &Path, mode: u32) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)?;
    set_mode(path, mode).await
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::Fs {
            context: "copying file",
            path: from.to_path_buf(),
            error: std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
        });
    }
    if !from.is_file() {
        bail!("{:?} is not a file", from);
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", from)?;
    Ok(())
}

/// Sets unix permission bits; a no-op elsewhere.
#[cfg(unix)]
pub async fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .fs_context("setting permissions on", path)
}

/// Sets unix permission bits; a no-op elsewhere.
#[cfg(not(unix))]
pub async fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Size and lowercase hex MD5 digest of a file
pub async fn md5_file(path: &Path) -> Result<(u64, String)> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<(u64, String)> {
        let mut src = std::fs::File::open(&path).fs_context("opening file for MD5", &path)?;
        let mut context = md5::Context::new();
        let size = std::io::copy(&mut src, &mut context).fs_context("hashing package", &path)?;
        let digest = context.finalize();
        Ok((size, format!("{:x}", digest)))
    })
    .await
    .map_err(|e| Error::GenericError(format!("hashing task failed: {}", e)))?
}
