//! Lock type definitions and information structures.

use super::metadata::HolderMetadata;
use std::fs::{File, Metadata};
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// Device and inode pair naming one file independently of its paths.
///
/// Paths can be replaced between two syscalls; the identity cannot, which is
/// why ownership is proven by comparing identities rather than contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub dev: u64,
    pub ino: u64,
}

impl FileIdentity {
    pub(crate) fn from_metadata(meta: &Metadata) -> Self {
        Self {
            dev: meta.dev(),
            ino: meta.ino(),
        }
    }

    /// Identity of whatever `path` currently names (follows symlinks).
    pub fn of_path(path: &Path) -> io::Result<Self> {
        std::fs::metadata(path).map(|m| Self::from_metadata(&m))
    }

    /// Identity of an open file.
    pub fn of_file(file: &File) -> io::Result<Self> {
        file.metadata().map(|m| Self::from_metadata(&m))
    }
}

/// State of a lock as seen from outside the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No shared lock file exists.
    Free,
    /// The shared lock file exists and its holder is alive or unknown.
    Held,
    /// The shared lock file exists but its recorded holder is gone.
    Stale,
}

impl LockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockState::Free => "free",
            LockState::Held => "held",
            LockState::Stale => "stale",
        }
    }
}

/// Information about a lock file.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The shared lock path (`target~`).
    pub path: PathBuf,

    /// Current state of the lock.
    pub state: LockState,

    /// Identity of the shared lock file, if it exists.
    pub identity: Option<FileIdentity>,

    /// Holder metadata, if the lock file carries any.
    pub holder: Option<HolderMetadata>,
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}", self.path.display(), self.state.as_str())?;
        if let Some(holder) = &self.holder {
            write!(
                f,
                ", owner: {}, pid: {}, age: {}",
                holder.owner,
                holder.pid,
                holder.age_string()
            )?;
        } else if self.state != LockState::Free {
            write!(f, ", holder unknown")?;
        }
        write!(f, ")")
    }
}
