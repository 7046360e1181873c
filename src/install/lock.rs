//! Per-version provisioning lock
//!
//! Serializes first-time provisioning of one version across processes sharing
//! the same cache root.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info};

use crate::install::error::ProvisionError;

/// Acquire the exclusive lock for `version`, waiting for other holders.
/// Returns a guard that releases the lock when dropped.
///
/// The lock file itself is never deleted, so every process locks the same inode.
pub async fn acquire_version_lock(
    cache_root: &Path,
    version: &str,
) -> Result<VersionLock, ProvisionError> {
    let path = cache_root.join(format!("{}.lock", version));

    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(|e| ProvisionError::Lock {
            path: path.clone(),
            source: e,
        })?;

    if file.try_lock_exclusive().is_ok() {
        debug!("Acquired lock {:?}", path);
        return Ok(VersionLock { file, path });
    }

    info!(
        "Version {} is being installed by another process, waiting",
        version
    );

    let lock_path = path.clone();
    let file = tokio::task::spawn_blocking(move || file.lock_exclusive().map(|()| file))
        .await
        .map_err(|e| ProvisionError::Lock {
            path: lock_path.clone(),
            source: std::io::Error::other(e),
        })?
        .map_err(|e| ProvisionError::Lock {
            path: lock_path,
            source: e,
        })?;

    debug!("Acquired lock {:?} after waiting", path);
    Ok(VersionLock { file, path })
}

/// RAII guard for a version lock
#[derive(Debug)]
pub struct VersionLock {
    file: File,
    path: PathBuf,
}

impl VersionLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for VersionLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn lock_acquired_successfully() {
        let dir = TempDir::new().unwrap();

        let lock = acquire_version_lock(dir.path(), "1.5.3").await.unwrap();

        assert_eq!(lock.path(), dir.path().join("1.5.3.lock"));
        assert!(lock.path().exists());
    }

    #[tokio::test]
    async fn lock_file_survives_release() {
        let dir = TempDir::new().unwrap();

        let lock = acquire_version_lock(dir.path(), "1.5.3").await.unwrap();
        drop(lock);

        assert!(dir.path().join("1.5.3.lock").exists());
        // and can be taken again
        acquire_version_lock(dir.path(), "1.5.3").await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn second_acquire_waits_for_release() {
        let dir = TempDir::new().unwrap();
        let first = acquire_version_lock(dir.path(), "1.5.3").await.unwrap();

        let root = dir.path().to_path_buf();
        let waiter = tokio::spawn(async move { acquire_version_lock(&root, "1.5.3").await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiter.is_finished());

        drop(first);
        let second = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn different_versions_do_not_contend() {
        let dir = TempDir::new().unwrap();

        let _a = acquire_version_lock(dir.path(), "1.5.3").await.unwrap();
        let b = acquire_version_lock(dir.path(), "1.6.0").await;

        assert!(b.is_ok());
    }
}
