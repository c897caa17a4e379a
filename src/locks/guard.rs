//! RAII lock guard implementation.

use super::handle::LockHandle;
use std::path::Path;

/// RAII guard for an acquired lock.
///
/// The lock is held for as long as the guard lives. Dropping it, including
/// during unwinding or an early `?` return, runs the release protocol.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    handle: LockHandle,
}

impl LockGuard {
    pub(super) fn new(handle: LockHandle) -> Self {
        Self { handle }
    }

    /// Get the path to the shared lock file.
    pub fn shared_path(&self) -> &Path {
        self.handle.shared_path()
    }

    /// The handle holding the lock.
    pub fn handle(&self) -> &LockHandle {
        &self.handle
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(mut self) {
        self.handle.release();
    }
}

impl LockHandle {
    /// Acquire the lock and wrap the handle in a guard that releases it.
    pub fn lock(mut self) -> crate::error::Result<LockGuard> {
        self.acquire()?;
        Ok(LockGuard::new(self))
    }
}
