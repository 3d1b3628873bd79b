//! core
//!
//! Shared building blocks for the lock backends and the wait loop.
//!
//! # Modules
//!
//! - [`error`] - Error type and temporary/permanent classification
//! - [`config`] - Tunables and TOML loading
//! - [`backoff`] - Jittered capped-linear backoff

pub mod backoff;
pub mod config;
pub mod error;
