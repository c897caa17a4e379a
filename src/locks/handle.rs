//! The lock handle: derived paths, descriptor, and ownership state.

use super::operations::shared_path_for;
use super::types::FileIdentity;
use crate::config::Config;
use crate::error::{LockError, Result};
use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Suffix that turns the protected file into the shared lock path.
pub const LOCK_SUFFIX: &str = "~";

/// Separator between the shared lock path and a private link id.
pub const LINK_SEPARATOR: &str = ".";

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(0);

/// Default private-link id: process id plus a per-process sequence number,
/// so that handles on different threads of one process never collide.
fn default_id() -> String {
    let seq = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", std::process::id(), seq)
}

/// One attempt at holding the lock for a target file.
///
/// A handle derives two paths from the target: the shared lock path
/// (`target~`) that every contender links into, and a private link path
/// (`target~.<id>`) used only to win that race. The handle is not
/// reentrant; use one handle per thread of control.
///
/// Dropping the handle releases it.
pub struct LockHandle {
    pub(super) shared_path: PathBuf,
    pub(super) private_path: PathBuf,
    pub(super) id: String,
    pub(super) descriptor: Option<File>,
    pub(super) owned: bool,
    pub(super) link_identity: Option<FileIdentity>,
    pub(super) config: Config,
}

impl LockHandle {
    /// Create an unowned handle for `target` with a process-unique id and
    /// the default configuration.
    pub fn new<P: AsRef<Path>>(target: P) -> Result<Self> {
        Self::build(target.as_ref(), default_id(), Config::default())
    }

    /// Create an unowned handle with a caller-chosen private link id.
    ///
    /// The id must be unique among concurrent contenders for the same target.
    pub fn with_id<P: AsRef<Path>>(target: P, id: impl fmt::Display) -> Result<Self> {
        Self::build(target.as_ref(), validate_id(id.to_string())?, Config::default())
    }

    /// Create an unowned handle with an explicit id (or the default one) and
    /// configuration.
    pub fn with_config<P: AsRef<Path>>(
        target: P,
        id: Option<&str>,
        config: Config,
    ) -> Result<Self> {
        let id = match id {
            Some(id) => validate_id(id.to_string())?,
            None => default_id(),
        };
        config.validate()?;
        Self::build(target.as_ref(), id, config)
    }

    fn build(target: &Path, id: String, config: Config) -> Result<Self> {
        let shared_path = shared_path_for(target)?;
        let mut private = OsString::from(shared_path.as_os_str());
        private.push(LINK_SEPARATOR);
        private.push(&id);

        let handle = Self {
            shared_path,
            private_path: PathBuf::from(private),
            id,
            descriptor: None,
            owned: false,
            link_identity: None,
            config,
        };
        debug!(
            shared = %handle.shared_path.display(),
            private = %handle.private_path.display(),
            "alloc"
        );
        Ok(handle)
    }

    /// Path of the shared lock file (e.g. `/etc/mtab~`).
    pub fn shared_path(&self) -> &Path {
        &self.shared_path
    }

    /// Path of this handle's private link file (e.g. `/etc/mtab~.1234-0`).
    pub fn private_path(&self) -> &Path {
        &self.private_path
    }

    /// The private link id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this handle currently holds the lock.
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// The configuration this handle acquires with.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

fn validate_id(id: String) -> Result<String> {
    if id.is_empty() {
        return Err(LockError::InvalidArgument(
            "link id must not be empty".to_string(),
        ));
    }
    if id.contains('/') || id.contains('\0') {
        return Err(LockError::InvalidArgument(format!(
            "link id '{}' must not contain '/' or NUL",
            id.escape_debug()
        )));
    }
    Ok(id)
}

impl fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("shared_path", &self.shared_path)
            .field("private_path", &self.private_path)
            .field("owned", &self.owned)
            .field("open", &self.descriptor.is_some())
            .finish()
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        self.release();
    }
}
