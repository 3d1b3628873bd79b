//! lockfile - cross-process mutual exclusion built on lock files
//!
//! Independent processes agree that at most one of them holds a named
//! resource by creating a zero-byte lock file and holding an OS-level
//! exclusivity marker on it. The lock file is deleted again on release.
//!
//! # Architecture
//!
//! - [`lock`] - The lock file handle and the compile-time selected platform
//!   backend (`flock` on Unix, exclusive share mode on Windows)
//! - [`wait`] - Cancelable retry loop with jittered backoff
//! - [`core`] - Error classification, configuration, backoff math
//! - [`cli`] - The `lockfile` command-line tool
//!
//! # Correctness Invariants
//!
//! 1. At most one process holds a lock file for a given path at any instant
//! 2. A lock file is never deleted while its path refers to a different file
//! 3. A lock file is deleted before its exclusivity marker is released
//! 4. Cancellation is reported separately from contention
//!
//! # Example
//!
//! ```no_run
//! use lockfile::{LockError, LockFile};
//!
//! match LockFile::acquire("/tmp/app.lock") {
//!     Ok(lock) => {
//!         // ... critical section ...
//!         lock.release()?;
//!     }
//!     Err(e) if e.is_temporary() => println!("busy, try later"),
//!     Err(e) => return Err(e),
//! }
//! # Ok::<(), LockError>(())
//! ```

pub mod cli;
pub mod core;
pub mod lock;
pub mod wait;

pub use crate::core::config::LockConfig;
pub use crate::core::error::{is_temporary, LockError, Result};
pub use lock::{ActiveBackend, Backend, LockFile};
pub use wait::{wait, Waiter};
