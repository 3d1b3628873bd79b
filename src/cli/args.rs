//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--config <file>`: Load lock settings from a TOML file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// lockfile - take a cross-process lock file from the shell
#[derive(Parser, Debug)]
#[command(name = "lockfile")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Load lock settings from a TOML file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Make a single attempt to acquire a lock file
    #[command(
        name = "try",
        long_about = "Make a single attempt to acquire a lock file.\n\n\
            Exits 0 if the lock was free (it is released again immediately) \
            and 3 if another process holds it. Any other failure exits 1."
    )]
    Try {
        /// Path of the lock file
        path: PathBuf,
    },

    /// Wait for a lock file and hold it
    #[command(
        name = "hold",
        long_about = "Wait for a lock file, print 'acquired' and hold it.\n\n\
            The lock is held for --hold-ms milliseconds, or until standard \
            input is closed when --hold-ms is not given.",
        after_help = "\
EXAMPLES:
    # Hold the lock for two seconds
    lockfile hold /tmp/app.lock --hold-ms 2000

    # Give up if the lock is not free within half a second
    lockfile hold /tmp/app.lock --timeout-ms 500 --hold-ms 100"
    )]
    Hold {
        /// Path of the lock file
        path: PathBuf,

        /// Give up waiting after this many milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Hold the lock for this many milliseconds
        #[arg(long, value_name = "MS")]
        hold_ms: Option<u64>,
    },

    /// Run a command while holding a lock file
    #[command(
        name = "run",
        after_help = "\
EXAMPLES:
    # Serialize deploys across shells
    lockfile run /tmp/deploy.lock -- ./deploy.sh --prod"
    )]
    Run {
        /// Path of the lock file
        path: PathBuf,

        /// Give up waiting after this many milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Command and arguments to run
        #[arg(last = true, required = true, value_name = "COMMAND")]
        command: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_trailing_command() {
        let cli = Cli::try_parse_from([
            "lockfile",
            "run",
            "/tmp/x.lock",
            "--timeout-ms",
            "50",
            "--",
            "echo",
            "--flag",
        ])
        .expect("parse");
        match cli.command {
            Command::Run {
                path,
                timeout_ms,
                command,
            } => {
                assert_eq!(path, PathBuf::from("/tmp/x.lock"));
                assert_eq!(timeout_ms, Some(50));
                assert_eq!(command, vec!["echo", "--flag"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_requires_a_command() {
        assert!(Cli::try_parse_from(["lockfile", "run", "/tmp/x.lock"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["lockfile", "try", "a.lock", "--debug"]).expect("parse");
        assert!(cli.debug);
        assert!(cli.config.is_none());
    }
}
