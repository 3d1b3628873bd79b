//! core::error
//!
//! Error type for lock file operations and the temporary/permanent
//! classification used by the wait loop.
//!
//! # Taxonomy
//!
//! - **Temporary**: someone else currently holds the lock, or the
//!   exclusive-handle backend saw an ambiguous access-denied while a previous
//!   lock file was pending deletion. Retried by [`crate::wait`], never by
//!   [`crate::LockFile::acquire`] itself.
//! - **Permanent**: corruption, identity mismatch, exhausted ghost-inode
//!   retries, I/O failures, double release, bad configuration.
//! - **Cancelled**: the caller gave up waiting. Kept separate from contention
//!   so "gave up" is never confused with "someone else has it".
//!
//! # Example
//!
//! ```
//! use lockfile::LockError;
//! use std::path::PathBuf;
//!
//! let err = LockError::AlreadyHeld { path: PathBuf::from("app.lock") };
//! assert!(err.is_temporary());
//! assert!(!LockError::AlreadyClosed.is_temporary());
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::lock::{ActiveBackend, Backend};

/// Errors from lock file operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another live process holds the advisory lock on the file.
    #[error("lock file '{}' is held by another process", .path.display())]
    AlreadyHeld { path: PathBuf },

    /// The lock file already exists (exclusive-handle backend).
    #[error("lock file '{}' already exists", .path.display())]
    AlreadyExists { path: PathBuf },

    /// Access was denied while opening the lock file.
    ///
    /// On the exclusive-handle backend this is also what a lock file pending
    /// deletion looks like, so it cannot be told apart from a real permission
    /// problem.
    #[error("access denied to lock file '{}': {source}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The lock file has content. Lock files are always empty.
    #[error("lock file '{}' is not empty ({size} bytes)", .path.display())]
    NotEmpty { path: PathBuf, size: u64 },

    /// Every attempt locked an inode that had already been unlinked.
    #[error(
        "lock file '{}' kept being deleted underneath us ({attempts} attempts)",
        .path.display()
    )]
    StaleInode { path: PathBuf, attempts: u32 },

    /// The path no longer refers to the file we hold open.
    #[error("lock file '{}' was moved or replaced while held", .path.display())]
    Integrity { path: PathBuf },

    /// The lock file has already been released.
    #[error("lock file already released")]
    AlreadyClosed,

    /// Waiting for the lock was cancelled before it could be acquired.
    #[error(
        "waiting for lock file '{}' was cancelled after {attempts} attempts",
        .path.display()
    )]
    Cancelled { path: PathBuf, attempts: u32 },

    /// An I/O operation on the lock file failed.
    #[error("failed to {op} lock file '{}': {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Lock configuration could not be loaded or is invalid.
    #[error("invalid lock configuration: {0}")]
    Config(String),
}

impl LockError {
    /// Whether this error indicates temporary contention for the lock file.
    ///
    /// See [`is_temporary`].
    pub fn is_temporary(&self) -> bool {
        is_temporary(self)
    }

    /// Wrap an I/O error that occurred while performing `op` on `path`.
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        LockError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Returns true if `err`, as returned by an acquisition attempt, indicates
/// temporary contention of the lock file.
///
/// `PermissionDenied` only counts as temporary on the exclusive-handle
/// backend, where a lock file that is still being deleted by its previous
/// holder reports access denied.
pub fn is_temporary(err: &LockError) -> bool {
    match err {
        LockError::AlreadyHeld { .. } | LockError::AlreadyExists { .. } => true,
        LockError::PermissionDenied { .. } => ActiveBackend::PERMISSION_DENIED_IS_TEMPORARY,
        LockError::NotEmpty { .. }
        | LockError::StaleInode { .. }
        | LockError::Integrity { .. }
        | LockError::AlreadyClosed
        | LockError::Cancelled { .. }
        | LockError::Io { .. }
        | LockError::Config(_) => false,
    }
}

/// Result type alias for lock file operations.
pub type Result<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> PathBuf {
        PathBuf::from("test.lock")
    }

    #[test]
    fn contention_is_temporary() {
        assert!(is_temporary(&LockError::AlreadyHeld { path: path() }));
        assert!(is_temporary(&LockError::AlreadyExists { path: path() }));
    }

    #[test]
    fn permanent_errors_are_not_temporary() {
        let permanent = [
            LockError::NotEmpty {
                path: path(),
                size: 3,
            },
            LockError::StaleInode {
                path: path(),
                attempts: 8,
            },
            LockError::Integrity { path: path() },
            LockError::AlreadyClosed,
            LockError::Cancelled {
                path: path(),
                attempts: 2,
            },
            LockError::io("open", path(), io::Error::other("boom")),
            LockError::Config("bad".into()),
        ];
        for err in &permanent {
            assert!(!err.is_temporary(), "{err} should be permanent");
        }
    }

    #[test]
    fn permission_denied_follows_backend() {
        let err = LockError::PermissionDenied {
            path: path(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.is_temporary(), cfg!(windows));
    }

    #[test]
    fn error_display_formatting() {
        let err = LockError::AlreadyHeld { path: path() };
        assert!(err.to_string().contains("test.lock"));
        assert!(err.to_string().contains("held"));

        let err = LockError::NotEmpty {
            path: path(),
            size: 12,
        };
        assert!(err.to_string().contains("12 bytes"));

        let err = LockError::Cancelled {
            path: path(),
            attempts: 4,
        };
        assert!(err.to_string().contains("cancelled after 4 attempts"));

        let err = LockError::io("unlink", path(), io::Error::other("disk gone"));
        assert!(err.to_string().contains("failed to unlink"));
    }

    #[test]
    fn io_error_keeps_source() {
        use std::error::Error as _;

        let err = LockError::io("stat", path(), io::Error::other("inner"));
        let source = err.source().expect("io error has a source");
        assert_eq!(source.to_string(), "inner");
    }
}
