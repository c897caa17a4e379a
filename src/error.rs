//! Error types for linklock.
//!
//! Uses thiserror for derive macros. Callers only ever see the four kinds
//! below; transient races inside the acquire loop are recovered locally.

use crate::exit_codes;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for lock operations.
///
/// Each variant maps to a specific exit code of the `linklock` binary.
#[derive(Error, Debug)]
pub enum LockError {
    /// Bad construction or configuration input. Never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The private link file could not be created (read-only or full
    /// filesystem, descriptor exhaustion, permissions).
    #[error("cannot create link file '{}': {source}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The deadline passed while another holder kept the lock.
    #[error(
        "timed out after {}ms waiting for lock '{}' (perhaps there is a stale lock file?)",
        waited.as_millis(),
        path.display()
    )]
    TimedOut { path: PathBuf, waited: Duration },

    /// Any other unexpected system failure during the protocol.
    #[error("{op} '{}' failed: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        LockError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// The underlying OS error code, when the failure came from a syscall.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            LockError::ResourceUnavailable { source, .. } | LockError::Io { source, .. } => {
                source.raw_os_error()
            }
            LockError::InvalidArgument(_) => Some(libc::EINVAL),
            LockError::TimedOut { .. } => Some(libc::ETIMEDOUT),
        }
    }

    /// Whether this error suggests a stale lock file left by a dead holder.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LockError::TimedOut { .. })
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LockError::InvalidArgument(_) => exit_codes::INVALID_ARGUMENT,
            LockError::ResourceUnavailable { .. } => exit_codes::RESOURCE_UNAVAILABLE,
            LockError::Io { .. } => exit_codes::IO_FAILURE,
            LockError::TimedOut { .. } => exit_codes::LOCK_TIMEOUT,
        }
    }
}

/// Result type alias for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_has_correct_exit_code() {
        let err = LockError::InvalidArgument("empty target path".to_string());
        assert_eq!(err.exit_code(), exit_codes::INVALID_ARGUMENT);
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
    }

    #[test]
    fn resource_unavailable_keeps_errno() {
        let err = LockError::ResourceUnavailable {
            path: PathBuf::from("/ro/table~.1"),
            source: io::Error::from_raw_os_error(libc::EROFS),
        };
        assert_eq!(err.exit_code(), exit_codes::RESOURCE_UNAVAILABLE);
        assert_eq!(err.raw_os_error(), Some(libc::EROFS));
    }

    #[test]
    fn io_error_keeps_errno() {
        let err = LockError::io(
            "link",
            "/etc/table~",
            io::Error::from_raw_os_error(libc::EPERM),
        );
        assert_eq!(err.exit_code(), exit_codes::IO_FAILURE);
        assert_eq!(err.raw_os_error(), Some(libc::EPERM));
        assert!(err.to_string().starts_with("link '/etc/table~' failed"));
    }

    #[test]
    fn timeout_message_hints_at_stale_lock() {
        let err = LockError::TimedOut {
            path: PathBuf::from("/etc/table~"),
            waited: Duration::from_millis(1500),
        };
        assert!(err.is_timeout());
        assert_eq!(err.exit_code(), exit_codes::LOCK_TIMEOUT);
        let msg = err.to_string();
        assert!(msg.contains("1500ms"));
        assert!(msg.contains("/etc/table~"));
        assert!(msg.contains("stale lock"));
    }
}
