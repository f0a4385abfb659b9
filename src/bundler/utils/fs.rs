//! File system helpers for staging trees.
//!
//! Every helper creates missing parent directories and reports failures with
//! the offending path.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::path::Path;
use tokio::fs;

/// Writes `contents` to `path`, creating parent directories.
pub async fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .fs_context("creating directory", parent)?;
    }
    fs::write(path, contents)
        .await
        .fs_context("writing file", path)
}

/// Creates all directories of `path`, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .await
            .fs_context("removing directory", path)?;
    }
    Ok(())
}

/// Whether `path` is a directory with at least one entry.
pub async fn is_non_empty_dir(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(path)
        .await
        .fs_context("reading directory", path)?;
    Ok(entries
        .next_entry()
        .await
        .fs_context("reading directory", path)?
        .is_some())
}

/// Copies a regular file, creating the destination's parent directories.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Err(Error::NotFound {
            what: "file".into(),
            path: from.to_path_buf(),
        });
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", from)?;
    Ok(())
}

/// Marks a file executable (`0755`).
///
/// Best effort: failures are logged and otherwise ignored. No-op off Unix.
pub async fn set_executable(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o755);
        if let Err(e) = fs::set_permissions(path, perms).await {
            log::warn!("Could not make {} executable: {}", path.display(), e);
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

/// Total size in bytes of a file or directory tree.
pub fn total_size(path: &Path) -> Result<u64> {
    if path.is_file() {
        return Ok(std::fs::metadata(path)
            .fs_context("reading metadata", path)?
            .len());
    }
    let mut size = 0;
    for entry in walkdir::WalkDir::new(path) {
        let entry = entry?;
        if entry.file_type().is_file() {
            size += entry.metadata().map_err(Error::from)?.len();
        }
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn total_size_sums_a_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let tree = tmp.path().join("tree");
        write_file(&tree.join("a/b.txt"), "hello").await.unwrap();
        write_file(&tree.join("c.txt"), "world").await.unwrap();

        assert_eq!(total_size(&tree).unwrap(), 10);
        assert_eq!(total_size(&tree.join("c.txt")).unwrap(), 5);
    }

    #[tokio::test]
    async fn empty_directory_detection() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!is_non_empty_dir(tmp.path()).await.unwrap());
        write_file(&tmp.path().join("x"), "").await.unwrap();
        assert!(is_non_empty_dir(tmp.path()).await.unwrap());
        assert!(!is_non_empty_dir(&tmp.path().join("missing")).await.unwrap());
    }

    #[tokio::test]
    async fn copying_missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = copy_file(&tmp.path().join("nope"), &tmp.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn executables_get_mode_755() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("run");
        write_file(&file, "#!/bin/sh\n").await.unwrap();
        set_executable(&file).await;
        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
