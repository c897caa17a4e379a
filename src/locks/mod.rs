//! Link-based cross-process locking.
//!
//! This module implements the lock protocol used to serialize writers of a
//! shared file (e.g. `/etc/mtab`) among unrelated processes:
//! - Lock Handle: derived shared/private paths, descriptor, ownership
//! - Acquire: link-then-verify loop with a deadline-bounded record-lock wait
//! - Release: ownership re-verification by inode identity, idempotent cleanup
//!
//! # Lock Files
//!
//! For a target `/etc/mtab` the shared lock file is `/etc/mtab~` and each
//! contender uses a private link file `/etc/mtab~.<id>`. The protocol is
//! compatible with other tools that lock the same file this way.
//!
//! # RAII Guards
//!
//! [`LockHandle::lock`] and [`lock`] return a [`LockGuard`] that releases the
//! lock when dropped, on every exit path.

mod acquire;
mod alarm;
mod guard;
mod handle;
mod metadata;
mod operations;
mod record;
mod release;
mod types;


// Re-export public API
pub use guard::LockGuard;
pub use handle::{LINK_SEPARATOR, LOCK_SUFFIX, LockHandle};
pub use metadata::HolderMetadata;
pub use operations::{clear_stale, inspect, lock, lock_with_config, shared_path_for, with_lock};
pub use types::{FileIdentity, LockInfo, LockState};
