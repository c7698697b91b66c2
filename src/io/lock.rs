//! Lock file management for single-instance enforcement.
//!
//! The daemon holds an exclusive `fs2` lock on `raillamp.lock` in the runtime
//! directory for its whole lifetime. The file records the PID and the custom
//! config directory (if any) so CLI commands can find and signal it.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config;
use crate::constants::LOCK_FILE_NAME;
use crate::io::instance::{self, InstanceInfo};

/// `$XDG_RUNTIME_DIR`, falling back to `/tmp`.
pub fn runtime_dir() -> PathBuf {
    std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

pub fn get_main_lock_path() -> PathBuf {
    runtime_dir().join(LOCK_FILE_NAME)
}

/// A held instance lock. Released and removed by [`LockFile::release`].
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(self, debug_enabled: bool) {
        let _ = FileExt::unlock(&self.file);
        drop(self.file);
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                if debug_enabled {
                    log_decorated!("Lock file removed");
                }
            }
            Err(e) => log_warning!("Failed to remove lock file: {e}"),
        }
    }
}

/// Acquire the instance lock at the default path.
pub fn acquire_lock() -> Result<LockFile> {
    acquire_lock_at(&get_main_lock_path())
}

/// Acquire an exclusive lock on `lock_path`.
///
/// A lock left behind by a dead process is cleaned up and retried once. A
/// live holder is an error.
pub fn acquire_lock_at(lock_path: &Path) -> Result<LockFile> {
    if let Some(file) = try_lock(lock_path)? {
        return Ok(LockFile {
            file,
            path: lock_path.to_path_buf(),
        });
    }

    handle_lock_conflict(lock_path)?;

    match try_lock(lock_path)? {
        Some(file) => Ok(LockFile {
            file,
            path: lock_path.to_path_buf(),
        }),
        None => anyhow::bail!("Failed to acquire lock after cleanup attempt"),
    }
}

fn try_lock(lock_path: &Path) -> Result<Option<File>> {
    // Open without truncating so a live holder's contents survive a failed attempt.
    let mut lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

    if lock_file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    let info = InstanceInfo {
        pid: std::process::id(),
        config_dir: config::get_custom_config_dir(),
    };
    lock_file.set_len(0)?;
    lock_file.seek(SeekFrom::Start(0))?;
    lock_file.write_all(info.to_lock_contents().as_bytes())?;
    lock_file.flush()?;

    Ok(Some(lock_file))
}

/// Remove a stale lock, or fail with hints if the holder is alive.
fn handle_lock_conflict(lock_path: &Path) -> Result<()> {
    let lock_content = match std::fs::read_to_string(lock_path) {
        Ok(content) => content,
        Err(_) => return Ok(()),
    };

    let info = match InstanceInfo::from_lock_contents(&lock_content) {
        Ok(info) => info,
        Err(_) => {
            log_warning!("Lock file format invalid, removing");
            let _ = std::fs::remove_file(lock_path);
            return Ok(());
        }
    };

    if !instance::is_instance_running(info.pid) {
        log_warning!(
            "Removing stale lock file (process {} no longer running)",
            info.pid
        );
        let _ = std::fs::remove_file(lock_path);
        return Ok(());
    }

    log_pipe!();
    log_error!("raillamp is already running (PID: {})", info.pid);
    log_block_start!("Did you mean to:");
    log_indented!("• Arm the light: raillamp arm <hours>");
    log_indented!("• Adjust it: raillamp set brightness <0-255>");
    log_indented!("• Check on it: raillamp status");
    anyhow::bail!("Cannot start - another raillamp instance is running")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_writes_pid_and_is_exclusive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let lock = acquire_lock_at(&path).unwrap();
        let info = InstanceInfo::from_lock_contents(&std::fs::read_to_string(&path).unwrap())
            .unwrap();
        assert_eq!(info.pid, std::process::id());

        // Our own PID is alive, so a second attempt must fail.
        assert!(acquire_lock_at(&path).is_err());

        lock.release(false);
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_lock_contents_are_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);
        std::fs::write(&path, "not a pid\n").unwrap();

        let lock = acquire_lock_at(&path).unwrap();
        assert_eq!(lock.path(), path.as_path());
        lock.release(false);
    }
}
