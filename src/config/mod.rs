//! Configuration model for linklock.
//!
//! This module defines the Config struct that tunes the acquire protocol
//! (deadline, retry back-off, holder recording, stale reclaim). It supports
//! forward-compatible YAML parsing (unknown fields are ignored), sensible
//! defaults for every field, and validation of config values.

mod model;
mod operations;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::{
    Config, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_MS, MAX_RETRY_DELAY_MS,
};
