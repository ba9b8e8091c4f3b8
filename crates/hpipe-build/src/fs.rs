//! Filesystem collaborator
//!
//! The orchestrator only needs a handful of filesystem operations. They sit
//! behind [`FileSystem`] so the driver and runner can be exercised without
//! touching disk.

use std::fs;
use std::io;
use std::path::Path;

/// Filesystem operations used by the compiler driver and the task runner
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;

    /// Remove a file or directory tree. Removing a missing path succeeds.
    fn remove_tree(&self, path: &Path) -> io::Result<()>;

    /// True if another process currently holds `path` open for execution or
    /// exclusive access, so overwriting it would fail or corrupt it.
    fn is_file_busy(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_tree(&self, path: &Path) -> io::Result<()> {
        let result = match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(e) => Err(e),
        };

        match result {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn is_file_busy(&self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }

        match fs::OpenOptions::new().write(true).open(path) {
            Ok(_) => false,
            Err(e) => is_busy_error(&e),
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}

/// ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
#[cfg(windows)]
fn is_busy_error(error: &io::Error) -> bool {
    matches!(error.raw_os_error(), Some(32) | Some(33))
}

/// ETXTBSY: the file is a running executable
#[cfg(unix)]
fn is_busy_error(error: &io::Error) -> bool {
    error.raw_os_error() == Some(26)
}

#[cfg(not(any(windows, unix)))]
fn is_busy_error(_error: &io::Error) -> bool {
    false
}
