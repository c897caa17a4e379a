//! Config struct definition and default implementation.

use serde::{Deserialize, Serialize};

/// Maximum time between the first and the last acquire attempt.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Pause between a waiter's wake-up and its next link attempt.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 5;

/// Upper bound (exclusive) for `retry_delay_ms`.
pub const MAX_RETRY_DELAY_MS: u64 = 1_000;

/// Configuration for lock acquisition.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Timing
    // =========================================================================
    /// Global acquire deadline in milliseconds. Time spent blocked on the
    /// record lock counts against it.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Sleep after a wake-up before retrying the link, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    // =========================================================================
    // Holder bookkeeping
    // =========================================================================
    /// Write holder metadata (owner, pid, timestamp) into the lock file.
    #[serde(default = "default_true")]
    pub record_holder: bool,

    /// Reclaim a lock whose recorded holder no longer runs on this host.
    #[serde(default = "default_true")]
    pub reclaim_stale: bool,
}

// Default value functions for serde
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            record_holder: default_true(),
            reclaim_stale: default_true(),
        }
    }
}
