//! wait
//!
//! Waiting for a lock file held by someone else.
//!
//! # Architecture
//!
//! [`LockFile::acquire`] makes a single attempt. The wait loop turns that
//! into "retry until acquired, failed for good, or cancelled":
//!
//! 1. Attempt once; return on success or on a permanent error
//! 2. Sleep for a jittered backoff delay, or stop if cancelled first
//! 3. Attempt again and repeat
//!
//! Cancellation is only observed while sleeping. An attempt in flight always
//! runs to completion, and no OS resource is held while sleeping.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> lockfile::Result<()> {
//! let cancel = CancellationToken::new();
//! let timer = cancel.clone();
//! tokio::spawn(async move {
//!     tokio::time::sleep(Duration::from_secs(5)).await;
//!     timer.cancel();
//! });
//!
//! let lock = lockfile::wait(&cancel, "/tmp/app.lock").await?;
//! // ... critical section ...
//! lock.release()?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::config::LockConfig;
use crate::core::error::{LockError, Result};
use crate::lock::LockFile;

/// Wait for the lock file at `path` with default settings.
///
/// Returns [`LockError::Cancelled`] if `cancel` fires before the lock is
/// acquired, or the first permanent error from an acquisition attempt.
pub async fn wait(cancel: &CancellationToken, path: impl AsRef<Path>) -> Result<LockFile> {
    Waiter::new(LockConfig::default()).wait(cancel, path).await
}

/// Retry loop for acquiring lock files.
///
/// Each `Waiter` owns its random source, so backoff is reproducible when it
/// is built with [`Waiter::with_seed`].
#[derive(Debug, Clone)]
pub struct Waiter {
    config: LockConfig,
    rng: StdRng,
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new(LockConfig::default())
    }
}

impl Waiter {
    /// Create a waiter seeded from the operating system.
    pub fn new(config: LockConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a waiter with a fixed seed.
    pub fn with_seed(config: LockConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Get the configuration in use.
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Wait until the lock file at `path` is acquired, a permanent error
    /// occurs, or `cancel` fires.
    ///
    /// The first attempt is made even if `cancel` has already fired.
    pub async fn wait(
        &mut self,
        cancel: &CancellationToken,
        path: impl AsRef<Path>,
    ) -> Result<LockFile> {
        let path = path.as_ref();
        let mut attempts = 1;
        if let Some(lock) = self.attempt(path)? {
            return Ok(lock);
        }

        loop {
            let delay = self.next_delay(path, attempts - 1);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(path = %path.display(), attempts, "wait for lock file cancelled");
                    return Err(LockError::Cancelled {
                        path: path.to_path_buf(),
                        attempts,
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }

            attempts += 1;
            if let Some(lock) = self.attempt(path)? {
                return Ok(lock);
            }
        }
    }

    /// Blocking version of [`Waiter::wait`] that gives up after `timeout`.
    ///
    /// Sleeps the calling thread between attempts. Running out of time is
    /// reported as [`LockError::Cancelled`].
    pub fn wait_timeout_blocking(
        &mut self,
        path: impl AsRef<Path>,
        timeout: Duration,
    ) -> Result<LockFile> {
        let path = path.as_ref();
        let deadline = Instant::now() + timeout;
        let mut attempts = 1;
        if let Some(lock) = self.attempt(path)? {
            return Ok(lock);
        }

        loop {
            let delay = self.next_delay(path, attempts - 1);
            let remaining = deadline.saturating_duration_since(Instant::now());
            if delay >= remaining {
                thread::sleep(remaining);
                debug!(path = %path.display(), attempts, "wait for lock file timed out");
                return Err(LockError::Cancelled {
                    path: path.to_path_buf(),
                    attempts,
                });
            }
            thread::sleep(delay);

            attempts += 1;
            if let Some(lock) = self.attempt(path)? {
                return Ok(lock);
            }
        }
    }

    /// One acquisition attempt. `Ok(None)` means temporary contention.
    fn attempt(&self, path: &Path) -> Result<Option<LockFile>> {
        match LockFile::acquire_with(path, &self.config) {
            Ok(lock) => Ok(Some(lock)),
            Err(e) if e.is_temporary() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn next_delay(&mut self, path: &Path, retry: u32) -> Duration {
        let delay = self.config.backoff.delay(retry, &mut self.rng);
        debug!(
            path = %path.display(),
            retry,
            delay_ms = delay.as_millis() as u64,
            "lock file busy, backing off"
        );
        delay
    }
}
