//! Exit code constants for the linklock CLI.
//!
//! - 0: Success
//! - 1: Invalid argument (bad path, id, or config value)
//! - 2: Resource unavailable (link file could not be created)
//! - 3: I/O failure during the protocol
//! - 4: Lock acquisition timed out

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Invalid argument: empty target, malformed id, or invalid configuration.
pub const INVALID_ARGUMENT: i32 = 1;

/// Resource unavailable: read-only/full filesystem or descriptor exhaustion.
pub const RESOURCE_UNAVAILABLE: i32 = 2;

/// Unexpected I/O failure while linking, opening, or locking.
pub const IO_FAILURE: i32 = 3;

/// Lock acquisition timed out (possibly a stale lock).
pub const LOCK_TIMEOUT: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            INVALID_ARGUMENT,
            RESOURCE_UNAVAILABLE,
            IO_FAILURE,
            LOCK_TIMEOUT,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn lock_timeout_keeps_lock_failure_code() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(LOCK_TIMEOUT, 4);
    }
}
