//! core::config
//!
//! Tunables for acquisition and waiting.
//!
//! # Overview
//!
//! Defaults match the behavior callers get from [`crate::LockFile::acquire`]
//! and [`crate::wait`], so most programs never touch this. Programs that
//! embed the settings in their own configuration can deserialize
//! [`LockConfig`] directly or load a standalone TOML file:
//!
//! ```toml
//! stale_retry_limit = 8
//!
//! [backoff]
//! step_ms = 10
//! max_attempt = 99
//! ```
//!
//! # Example
//!
//! ```
//! use lockfile::LockConfig;
//!
//! let config = LockConfig::from_toml_str("[backoff]\nstep_ms = 25\n").unwrap();
//! assert_eq!(config.backoff.step_ms, 25);
//! assert_eq!(config.backoff.max_attempt, 99);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::backoff::Backoff;
use super::error::{LockError, Result};

/// Default ceiling for the ghost-inode retry spin.
pub const DEFAULT_STALE_RETRY_LIMIT: u32 = 8;

/// Configuration for lock acquisition and waiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    /// How many times acquisition restarts after locking an inode that was
    /// unlinked by another process before giving up.
    pub stale_retry_limit: u32,

    /// Backoff used between attempts while waiting.
    pub backoff: Backoff,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            stale_retry_limit: DEFAULT_STALE_RETRY_LIMIT,
            backoff: Backoff::default(),
        }
    }
}

impl LockConfig {
    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LockConfig =
            toml::from_str(content).map_err(|e| LockError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            LockError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            LockError::Config(msg) => LockError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Check values that deserialize fine but cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.stale_retry_limit == 0 {
            return Err(LockError::Config(
                "stale_retry_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_document_gives_defaults() {
        let config = LockConfig::from_toml_str("").expect("parse");
        assert_eq!(config, LockConfig::default());
        assert_eq!(config.stale_retry_limit, DEFAULT_STALE_RETRY_LIMIT);
    }

    #[test]
    fn partial_backoff_keeps_other_defaults() {
        let config = LockConfig::from_toml_str(
            r#"
            stale_retry_limit = 3

            [backoff]
            max_attempt = 9
            "#,
        )
        .expect("parse");
        assert_eq!(config.stale_retry_limit, 3);
        assert_eq!(config.backoff.max_attempt, 9);
        assert_eq!(config.backoff.step_ms, Backoff::default().step_ms);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = LockConfig::from_toml_str("retries = 4").unwrap_err();
        assert!(matches!(err, LockError::Config(_)));
    }

    #[test]
    fn zero_stale_retry_limit_is_rejected() {
        let err = LockConfig::from_toml_str("stale_retry_limit = 0").unwrap_err();
        assert!(err.to_string().contains("stale_retry_limit"));
    }

    #[test]
    fn load_reads_file() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("lock.toml");
        fs::write(&path, "[backoff]\nstep_ms = 5\n").expect("write config");

        let config = LockConfig::load(&path).expect("load");
        assert_eq!(config.backoff.step_ms, 5);
    }

    #[test]
    fn load_missing_file_names_path() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("missing.toml");

        let err = LockConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn serializes_back_to_toml() {
        let text = toml::to_string(&LockConfig::default()).expect("serialize");
        assert!(text.contains("stale_retry_limit = 8"));
        assert!(text.contains("step_ms = 10"));
    }
}
