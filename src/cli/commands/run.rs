//! run command - Run a command while holding a lock file

use std::path::Path;
use std::process::{Command, ExitCode};
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use tracing::debug;

use super::{release, wait_for, EXIT_TIMED_OUT};
use crate::cli::Context;

/// Wait for the lock at `path` and run `command` while holding it.
///
/// The lock is released after the command exits, whatever its status. The
/// command's exit code is passed through; a command killed by a signal
/// counts as exit code 1.
pub fn run(
    ctx: &Context,
    path: &Path,
    timeout: Option<Duration>,
    command: &[String],
) -> Result<ExitCode> {
    let Some((program, args)) = command.split_first() else {
        bail!("No command given");
    };

    let Some(lock) = wait_for(ctx, path, timeout)? else {
        eprintln!("timed out waiting for '{}'", path.display());
        return Ok(ExitCode::from(EXIT_TIMED_OUT));
    };

    debug!(program = %program, "running command under lock");
    let status = Command::new(program).args(args).status();
    // Release before reporting a spawn failure so the lock never leaks.
    release(lock)?;
    let status = status.with_context(|| format!("Failed to run '{}'", program))?;

    let code = status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1);
    Ok(ExitCode::from(code))
}
