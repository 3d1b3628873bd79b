//! lock::windows
//!
//! Exclusive share-mode backend.
//!
//! The lock file is created with "create new" semantics, no sharing of any
//! kind, and the temporary and delete-on-close attributes. The OS enforces
//! exclusivity for as long as the handle is open and deletes the file when it
//! closes, so there is nothing to verify on either side.
//!
//! Unlike the `flock` backend, a leftover file at the path blocks
//! acquisition regardless of whether anyone holds it.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::windows::fs::OpenOptionsExt;
use std::os::windows::io::IntoRawHandle;
use std::path::Path;

use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};
use windows_sys::Win32::Storage::FileSystem::{
    FILE_ATTRIBUTE_TEMPORARY, FILE_FLAG_DELETE_ON_CLOSE,
};

use super::Backend;
use crate::core::config::LockConfig;
use crate::core::error::{LockError, Result};

/// Exclusive share-mode backend for Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShareModeBackend;

impl Backend for ShareModeBackend {
    // A lock file whose last handle is closing is "pending deletion" and
    // reports access denied until it is gone.
    const PERMISSION_DENIED_IS_TEMPORARY: bool = true;

    fn create(path: &Path, _config: &LockConfig) -> Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .share_mode(0)
            .attributes(FILE_ATTRIBUTE_TEMPORARY)
            .custom_flags(FILE_FLAG_DELETE_ON_CLOSE)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => LockError::AlreadyExists {
                    path: path.to_path_buf(),
                },
                // Either pending deletion or a real permission problem; the
                // error code does not say which.
                io::ErrorKind::PermissionDenied => LockError::PermissionDenied {
                    path: path.to_path_buf(),
                    source: e,
                },
                _ => LockError::io("create", path, e),
            })
    }

    fn remove(path: &Path, file: File) -> Result<()> {
        // Delete-on-close removes the file with the last handle.
        close(path, file)
    }
}

/// Close `file`, reporting errors that dropping it would swallow.
#[allow(unsafe_code)]
fn close(path: &Path, file: File) -> Result<()> {
    let handle = file.into_raw_handle() as HANDLE;
    // SAFETY: `handle` was just released from an owned `File`, so nothing
    // else refers to it and it is closed exactly once here.
    let ok = unsafe { CloseHandle(handle) };
    if ok != 0 {
        Ok(())
    } else {
        Err(LockError::io("close", path, io::Error::last_os_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LockFile;
    use tempfile::TempDir;

    #[test]
    fn stale_lock_file_blocks_acquisition() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("stale.lock");
        File::create(&path).expect("create stale file");

        let err = LockFile::acquire(&path).unwrap_err();
        assert!(matches!(err, LockError::AlreadyExists { .. }));
        assert!(err.is_temporary());
    }

    #[test]
    fn release_removes_file() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("closing.lock");

        let lock = LockFile::acquire(&path).expect("acquire");
        lock.release().expect("release");
        assert!(!path.exists());
    }

    #[test]
    fn closed_handle_frees_path_for_next_holder() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("reuse.lock");

        let file = ShareModeBackend::create(&path, &LockConfig::default()).expect("create");
        close(&path, file).expect("close");
        assert!(!path.exists());

        let again = ShareModeBackend::create(&path, &LockConfig::default()).expect("recreate");
        ShareModeBackend::remove(&path, again).expect("remove");
    }
}
