//! Linklock: crash-tolerant cross-process file locking.
//!
//! Serializes writers of a shared file among unrelated processes with the
//! hard-link handshake also used by other tools that edit files like
//! `/etc/mtab`: a contender creates `<target>~.<id>`, links it to
//! `<target>~`, and holds the lock only if that link was its own.
//!
//! ```no_run
//! use linklock::locks;
//!
//! let guard = locks::lock("/etc/mtab")?;
//! // ... rewrite /etc/mtab ...
//! drop(guard);
//! # Ok::<(), linklock::LockError>(())
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod locks;

pub use config::Config;
pub use error::{LockError, Result};
pub use locks::{LockGuard, LockHandle, lock, with_lock};
