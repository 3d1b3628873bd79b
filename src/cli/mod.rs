//! cli
//!
//! Command-line interface for taking lock files from the shell.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber
//! - Load lock settings and delegate to command handlers
//!
//! The CLI layer adds no locking semantics of its own; every command goes
//! through [`crate::LockFile`] and [`crate::Waiter`].

pub mod args;
pub mod commands;

pub use args::Cli;

use std::process::ExitCode;

use anyhow::{anyhow, Context as _, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::core::config::LockConfig;

/// Settings shared by all command handlers.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Lock settings in effect
    pub config: LockConfig,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug)?;

    let config = match &cli.config {
        Some(path) => LockConfig::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => LockConfig::default(),
    };

    let ctx = Context { config };

    commands::dispatch(cli.command, &ctx)
}

/// Install a stderr fmt subscriber filtered by `RUST_LOG`.
fn init_tracing(debug: bool) -> Result<()> {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize tracing subscriber: {e}"))
}
