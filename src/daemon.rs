//! Single-instance guard for the router daemon

use anyhow::{anyhow, Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exclusive lock on a lock file, released on drop
///
/// Whoever holds it owns the queue file: the daemon for its lifetime, the
/// offline CLI commands for the duration of one edit.
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Take the lock or fail immediately if someone else has it
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .with_context(|| format!("opening lock file {}", path.display()))?;

        file.try_lock_exclusive().map_err(|_| {
            let holder = Self::holder_pid(path)
                .map(|pid| format!("pid {}", pid))
                .unwrap_or_else(|| "unknown pid".to_string());
            anyhow!(
                "notification queue is in use by another router ({}, lock: {})",
                holder,
                path.display()
            )
        })?;

        file.set_len(0)?;
        write!(file, "{}", std::process::id())?;
        file.flush()?;
        debug!(path = %path.display(), "Acquired instance lock");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PID written by the current holder, if any
    pub fn holder_pid(path: &Path) -> Option<u32> {
        fs::read_to_string(path).ok()?.trim().parse().ok()
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!(path = %self.path.display(), "Released instance lock");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json.lock");

        let first = InstanceLock::acquire(&path).unwrap();
        assert_eq!(InstanceLock::holder_pid(&path), Some(std::process::id()));
        assert!(InstanceLock::acquire(&path).is_err());

        drop(first);
        assert!(InstanceLock::acquire(&path).is_ok());
    }

    #[test]
    fn test_acquire_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("lock");
        let lock = InstanceLock::acquire(&path).unwrap();
        assert_eq!(lock.path(), path.as_path());
    }
}
