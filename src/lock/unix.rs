//! lock::unix
//!
//! `flock(2)` backend.
//!
//! Opening a file and locking it are two separate system calls, and another
//! process may delete the lock file in between. Acquisition therefore opens,
//! locks, then checks the locked inode still has a name. Release checks the
//! path still names the inode we hold, unlinks it, and only then closes the
//! descriptor, so no other process can lock the old inode while its name is
//! still visible.
//!
//! The lock is advisory: it only excludes processes that take the same kind
//! of lock.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::os::unix::io::IntoRawFd;
use std::path::Path;

use fs2::FileExt;
use tracing::debug;

use super::Backend;
use crate::core::config::LockConfig;
use crate::core::error::{LockError, Result};

/// Lock files are readable by their owner only, so unprivileged processes
/// cannot take the lock and hold it forever.
const LOCK_FILE_MODE: u32 = 0o400;

/// Advisory-lock backend for Unix platforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlockBackend;

impl Backend for FlockBackend {
    const PERMISSION_DENIED_IS_TEMPORARY: bool = false;

    fn create(path: &Path, config: &LockConfig) -> Result<File> {
        lock_retrying(path, config.stale_retry_limit, open_lock_file)
    }

    fn remove(path: &Path, file: File) -> Result<()> {
        let unlinked = unlink_if_same(path, &file);
        // Closing releases the flock, so it must come after the unlink.
        let closed = close(path, file);
        unlinked.and(closed)
    }
}

/// Open and lock `path`, starting over while the locked inode turns out to
/// have been unlinked. At least one attempt is made whatever `limit` says.
fn lock_retrying<F>(path: &Path, limit: u32, mut open: F) -> Result<File>
where
    F: FnMut(&Path) -> Result<File>,
{
    let limit = limit.max(1);
    for attempt in 1..=limit {
        let file = open(path)?;

        // The lock belongs to this open file description. Whoever got it
        // first is responsible for deleting the file.
        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                return Err(LockError::AlreadyHeld {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(LockError::io("lock", path, e)),
        }

        if verify_locked(path, &file)? {
            return Ok(file);
        }
        debug!(path = %path.display(), attempt, "locked an unlinked lock file, retrying");
    }

    Err(LockError::StaleInode {
        path: path.to_path_buf(),
        attempts: limit,
    })
}

/// Check the file we just locked. `Ok(false)` means it has no links left:
/// another holder opened, locked and deleted it between our open and flock,
/// so the caller must start over.
fn verify_locked(path: &Path, file: &File) -> Result<bool> {
    let metadata = file
        .metadata()
        .map_err(|e| LockError::io("stat", path, e))?;

    if metadata.nlink() == 0 {
        return Ok(false);
    }

    if metadata.len() != 0 {
        return Err(LockError::NotEmpty {
            path: path.to_path_buf(),
            size: metadata.len(),
        });
    }

    Ok(true)
}

/// Open the lock file read-only, creating it if missing.
///
/// `OpenOptions::create` insists on write access, which would fail on an
/// existing `0400` file held by another process, so `O_CREAT` is passed
/// directly.
fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_CREAT)
        .mode(LOCK_FILE_MODE)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => LockError::PermissionDenied {
                path: path.to_path_buf(),
                source: e,
            },
            _ => LockError::io("open", path, e),
        })
}

/// Unlink `path` if it still names the inode behind `file`.
fn unlink_if_same(path: &Path, file: &File) -> Result<()> {
    let held = file
        .metadata()
        .map_err(|e| LockError::io("stat", path, e))?;

    // unlink(2) removes the name itself, so compare against the name's own
    // inode rather than a symlink target.
    let current = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LockError::Integrity {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(LockError::io("stat", path, e)),
    };

    if held.dev() != current.dev() || held.ino() != current.ino() {
        return Err(LockError::Integrity {
            path: path.to_path_buf(),
        });
    }

    fs::remove_file(path).map_err(|e| LockError::io("unlink", path, e))
}

/// Close `file`, reporting errors that dropping it would swallow.
#[allow(unsafe_code)]
fn close(path: &Path, file: File) -> Result<()> {
    let fd = file.into_raw_fd();
    // SAFETY: `fd` was just released from an owned `File`, so nothing else
    // refers to it and it is closed exactly once here.
    let rc = unsafe { libc::close(fd) };
    if rc == 0 {
        Ok(())
    } else {
        Err(LockError::io("close", path, io::Error::last_os_error()))
    }
}
