//! lock
//!
//! Lock files held by the current process.
//!
//! # Architecture
//!
//! A [`LockFile`] is a zero-byte file whose existence, together with an
//! OS-level exclusivity marker, tells other processes the named resource is
//! taken. The marker and the create/delete protocol around it depend on the
//! platform, so they live behind the [`Backend`] trait with exactly one
//! implementation compiled in:
//!
//! - Unix: [`FlockBackend`] - `flock(2)` advisory lock, verified create and
//!   verified unlink-before-unlock release
//! - Windows: `ShareModeBackend` - exclusive share mode with
//!   delete-on-close
//!
//! # Invariants
//!
//! - At most one open `LockFile` exists for a path across all processes
//! - A `LockFile` is only constructed by a successful acquisition
//! - Release deletes the lock file at most once, even when called
//!   concurrently from several threads
//!
//! # Example
//!
//! ```no_run
//! use lockfile::LockFile;
//!
//! let lock = LockFile::acquire("/tmp/app.lock")?;
//! // ... critical section ...
//! lock.release()?;
//! # Ok::<(), lockfile::LockError>(())
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::core::config::LockConfig;
use crate::core::error::{LockError, Result};

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::FlockBackend;
#[cfg(windows)]
pub use windows::ShareModeBackend;

/// The backend compiled in for this platform.
#[cfg(unix)]
pub type ActiveBackend = FlockBackend;

/// The backend compiled in for this platform.
#[cfg(windows)]
pub type ActiveBackend = ShareModeBackend;

/// Platform protocol for creating and deleting lock files.
pub trait Backend {
    /// Whether access denied from [`Backend::create`] may just mean a previous
    /// lock file is still being deleted.
    const PERMISSION_DENIED_IS_TEMPORARY: bool;

    /// Make one attempt to create and lock the file at `path`.
    ///
    /// Returns the open file carrying the exclusivity marker.
    fn create(path: &Path, config: &LockConfig) -> Result<File>;

    /// Delete the lock file at `path` and close `file`, releasing the marker.
    ///
    /// `file` is always closed, even when deletion fails.
    fn remove(path: &Path, file: File) -> Result<()>;
}

/// An open, exclusively held lock file.
///
/// The file stays locked until [`LockFile::release`] is called, which
/// deletes it and releases the OS resources behind it. Dropping an
/// unreleased `LockFile` releases it on a best-effort basis.
#[derive(Debug)]
pub struct LockFile {
    /// Path the lock file was created at.
    path: PathBuf,
    /// The open file holding the exclusivity marker.
    /// `None` once released.
    file: Mutex<Option<File>>,
}

impl LockFile {
    /// Attempt once to acquire the lock file at `path`.
    ///
    /// This never blocks waiting for another holder. Use [`crate::wait`] for
    /// that.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyHeld`] / [`LockError::AlreadyExists`] if another
    ///   process holds the lock (temporary)
    /// - [`LockError::PermissionDenied`] if the file cannot be opened
    /// - [`LockError::NotEmpty`] if the file at `path` has content
    /// - [`LockError::StaleInode`] if the file kept being deleted between
    ///   open and lock
    /// - [`LockError::Io`] for other I/O failures
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        Self::acquire_with(path, &LockConfig::default())
    }

    /// Attempt once to acquire the lock file at `path` using `config`.
    pub fn acquire_with(path: impl AsRef<Path>, config: &LockConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = ActiveBackend::create(path, config)?;
        debug!(path = %path.display(), "acquired lock file");
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(Some(file)),
        })
    }

    /// Try to acquire the lock, returning `None` if it is temporarily held.
    ///
    /// Permanent failures are still returned as errors.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lockfile::LockFile;
    ///
    /// if let Some(lock) = LockFile::try_acquire("/tmp/app.lock")? {
    ///     // We got the lock
    ///     lock.release()?;
    /// } else {
    ///     // Another process has it
    /// }
    /// # Ok::<(), lockfile::LockError>(())
    /// ```
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        match Self::acquire(path) {
            Ok(lock) => Ok(Some(lock)),
            Err(e) if e.is_temporary() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the lock file is still held.
    pub fn is_open(&self) -> bool {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Delete the lock file and release the lock.
    ///
    /// Safe to call from several threads at once; only the first call does
    /// any I/O. The handle counts as closed after the first call even if it
    /// fails.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyClosed`] if the lock was already released
    /// - [`LockError::Integrity`] if the path no longer refers to our file
    ///   (nothing is deleted in that case). On Unix the check compares the
    ///   name itself, not a symlink target, so a lock taken through a
    ///   symlinked path always fails here: symlinked lock paths are not
    ///   supported.
    /// - [`LockError::Io`] if deleting or closing the file fails
    pub fn release(&self) -> Result<()> {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let file = guard.take().ok_or(LockError::AlreadyClosed)?;
        ActiveBackend::remove(&self.path, file)?;
        debug!(path = %self.path.display(), "released lock file");
        Ok(())
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let file = self
            .file
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(file) = file {
            if let Err(e) = ActiveBackend::remove(&self.path, file) {
                warn!(path = %self.path.display(), error = %e, "failed to release dropped lock file");
            }
        }
    }
}
