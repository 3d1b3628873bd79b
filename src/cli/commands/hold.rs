//! hold command - Wait for a lock file and keep it for a while

use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use super::{release, wait_for, EXIT_TIMED_OUT};
use crate::cli::Context;

/// Wait for the lock at `path`, print `acquired`, hold it, then release it.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `path` - Lock file path
/// * `timeout` - Give up waiting after this long
/// * `hold_for` - How long to hold the lock; until stdin closes if `None`
pub fn hold(
    ctx: &Context,
    path: &Path,
    timeout: Option<Duration>,
    hold_for: Option<Duration>,
) -> Result<ExitCode> {
    let Some(lock) = wait_for(ctx, path, timeout)? else {
        eprintln!("timed out waiting for '{}'", path.display());
        return Ok(ExitCode::from(EXIT_TIMED_OUT));
    };

    println!("acquired");

    match hold_for {
        Some(duration) => thread::sleep(duration),
        None => {
            debug!("holding lock until stdin closes");
            // Any read error also ends the hold.
            let _ = io::stdin().read_to_end(&mut Vec::new());
        }
    }

    release(lock)?;
    println!("released");
    Ok(ExitCode::SUCCESS)
}
