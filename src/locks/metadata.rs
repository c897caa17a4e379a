//! Holder metadata written into the lock file.
//!
//! The acquiring process writes this JSON document into its private file
//! before linking it into place, so the shared lock file names its holder.
//! Tools that follow the same protocol but write nothing simply produce an
//! empty lock file, which reads back as "holder unknown".

use crate::error::{LockError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Lock metadata stored in lock files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderMetadata {
    /// Owner of the lock (e.g., `user@HOST`).
    pub owner: String,

    /// Host the holder runs on.
    pub host: String,

    /// Process ID of the lock holder.
    pub pid: u32,

    /// Identifier used for the holder's private link file.
    pub id: String,

    /// Timestamp when the lock file was prepared (RFC3339).
    pub created_at: DateTime<Utc>,
}

impl HolderMetadata {
    /// Create new holder metadata for this process with the current timestamp.
    pub fn new(id: &str) -> Self {
        let host = get_hostname();
        Self {
            owner: format!("{}@{}", get_username(), host),
            host,
            pid: std::process::id(),
            id: id.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Parse holder metadata from a lock file.
    ///
    /// Returns `Ok(None)` when the file is empty or was written by a tool
    /// that does not record its holder.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| LockError::io("read lock file", path, e))?;
        Ok(Self::parse(&content))
    }

    pub(crate) fn parse(content: &str) -> Option<Self> {
        serde_json::from_str(content.trim()).ok()
    }

    /// Serialize holder metadata to JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            LockError::InvalidArgument(format!("failed to serialize holder metadata: {}", e))
        })
    }

    /// Calculate the age of the lock.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let seconds = age.num_seconds();
        let minutes = age.num_minutes();
        let hours = age.num_hours();

        if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds % 60)
        } else {
            format!("{}s", seconds.max(0))
        }
    }

    /// Whether the holder runs on this host.
    pub fn is_local(&self) -> bool {
        self.host == get_hostname()
    }

    /// Whether the holder is known to be alive.
    ///
    /// Holders on other hosts cannot be checked and count as alive.
    pub fn is_alive(&self) -> bool {
        !self.is_local() || is_process_running(self.pid)
    }
}

/// Check if a process with the given PID is still running.
pub(crate) fn is_process_running(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs only the existence and permission checks.
    let rc = unsafe { libc::kill(pid, 0) };
    if rc == 0 {
        return true;
    }
    // EPERM: the process exists but belongs to someone else.
    io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

fn get_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn get_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
