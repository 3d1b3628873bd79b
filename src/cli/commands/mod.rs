//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Exit Codes
//!
//! - `0` - success (for `run`, the child's own status is passed through)
//! - `1` - any error
//! - `3` - `try`: the lock is held by another process
//! - `4` - `hold`/`run`: gave up waiting for the lock
//!
//! # Async Waiting
//!
//! Waiting uses [`crate::Waiter`], which is async. Handlers build a small
//! tokio runtime just for the wait and release the lock outside of it.

mod hold;
mod run;
mod try_cmd;

pub use hold::hold;
pub use run::run;
pub use try_cmd::try_lock;

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context as _, Result};
use tokio_util::sync::CancellationToken;

use super::args::Command;
use super::Context;
use crate::core::error::LockError;
use crate::lock::LockFile;
use crate::wait::Waiter;

/// The lock is held by another process.
pub const EXIT_CONTENDED: u8 = 3;

/// Waiting for the lock was cancelled or timed out.
pub const EXIT_TIMED_OUT: u8 = 4;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<ExitCode> {
    match command {
        Command::Try { path } => try_cmd::try_lock(ctx, &path),
        Command::Hold {
            path,
            timeout_ms,
            hold_ms,
        } => hold::hold(
            ctx,
            &path,
            timeout_ms.map(Duration::from_millis),
            hold_ms.map(Duration::from_millis),
        ),
        Command::Run {
            path,
            timeout_ms,
            command,
        } => run::run(ctx, &path, timeout_ms.map(Duration::from_millis), &command),
    }
}

/// Wait for the lock at `path`, giving up after `timeout` if set.
///
/// Returns `Ok(None)` when the wait was cancelled.
fn wait_for(ctx: &Context, path: &Path, timeout: Option<Duration>) -> Result<Option<LockFile>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    let mut waiter = Waiter::new(ctx.config.clone());
    let result = runtime.block_on(async {
        let cancel = CancellationToken::new();
        if let Some(timeout) = timeout {
            let timer = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                timer.cancel();
            });
        }
        waiter.wait(&cancel, path).await
    });

    match result {
        Ok(lock) => Ok(Some(lock)),
        Err(LockError::Cancelled { .. }) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to acquire '{}'", path.display())),
    }
}

/// Release `lock`, attaching the path to any error.
fn release(lock: LockFile) -> Result<()> {
    lock.release()
        .with_context(|| format!("Failed to release '{}'", lock.path().display()))
}
