//! try command - Single acquisition attempt

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result};

use super::{release, EXIT_CONTENDED};
use crate::cli::Context;
use crate::lock::LockFile;

/// Attempt once to acquire the lock at `path`.
///
/// Prints `free` and releases the lock again if it was acquired, prints
/// `held` and exits with [`EXIT_CONTENDED`] if someone else has it.
pub fn try_lock(ctx: &Context, path: &Path) -> Result<ExitCode> {
    let attempt = LockFile::acquire_with(path, &ctx.config);
    match attempt {
        Ok(lock) => {
            release(lock)?;
            println!("free");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_temporary() => {
            println!("held");
            Ok(ExitCode::from(EXIT_CONTENDED))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to acquire '{}'", path.display())),
    }
}
