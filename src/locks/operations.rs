//! Lock acquisition helpers, inspection, and stale-lock clearing.

use super::guard::LockGuard;
use super::handle::{LOCK_SUFFIX, LockHandle};
use super::metadata::HolderMetadata;
use super::record;
use super::types::{FileIdentity, LockInfo, LockState};
use crate::config::Config;
use crate::error::{LockError, Result};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Acquire the lock for `target` with the default configuration.
///
/// # Returns
///
/// * `Ok(LockGuard)` - Successfully acquired lock with RAII guard
/// * `Err(LockError)` - See [`LockHandle::acquire`]
pub fn lock<P: AsRef<Path>>(target: P) -> Result<LockGuard> {
    LockHandle::new(target)?.lock()
}

/// Acquire the lock for `target` with an explicit configuration.
pub fn lock_with_config<P: AsRef<Path>>(target: P, config: Config) -> Result<LockGuard> {
    LockHandle::with_config(target, None, config)?.lock()
}

/// Run `f` while holding the lock for `target` (default configuration).
///
/// The lock is released when `f` returns or panics.
pub fn with_lock<P, T, F>(target: P, f: F) -> Result<T>
where
    P: AsRef<Path>,
    F: FnOnce() -> T,
{
    let _guard = lock(target)?;
    Ok(f())
}

/// The shared lock path for a target, without creating a handle.
pub fn shared_path_for<P: AsRef<Path>>(target: P) -> Result<PathBuf> {
    let target = target.as_ref();
    if target.as_os_str().is_empty() {
        return Err(LockError::InvalidArgument(
            "target path must not be empty".to_string(),
        ));
    }
    let mut shared = OsString::from(target.as_os_str());
    shared.push(LOCK_SUFFIX);
    Ok(PathBuf::from(shared))
}

/// Read the holder recorded in an open lock file.
fn read_holder(file: &mut File) -> Option<HolderMetadata> {
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    HolderMetadata::parse(&content)
}

/// Read the holder of the lock file at `shared_path`, but only if that path
/// still names the inode `expected`.
fn holder_of(shared_path: &Path, expected: FileIdentity) -> Option<HolderMetadata> {
    let mut file = File::open(shared_path).ok()?;
    if FileIdentity::of_file(&file).ok()? != expected {
        return None;
    }
    read_holder(&mut file)
}

/// Remove the lock file at `shared_path` if its recorded holder is dead.
///
/// `locked` must be an open descriptor on which the caller holds the record
/// lock. Every reclaimer takes that record lock first, so two reclaimers can
/// never both decide to remove the same file, and a fresh lock file linked
/// after the removal is never touched.
pub(crate) fn reclaim_if_dead(shared_path: &Path, locked: &File) -> bool {
    let Ok(held) = FileIdentity::of_file(locked) else {
        return false;
    };
    if FileIdentity::of_path(shared_path).ok() != Some(held) {
        return false;
    }
    let Some(holder) = holder_of(shared_path, held) else {
        return false;
    };
    if holder.is_alive() {
        return false;
    }

    remove_lock_file(shared_path, held, &holder)
}

/// Remove a stale lock file and the dead holder's leftover link file.
fn remove_lock_file(shared_path: &Path, held: FileIdentity, holder: &HolderMetadata) -> bool {
    if FileIdentity::of_path(shared_path).ok() != Some(held) {
        return false;
    }
    if let Err(e) = fs::remove_file(shared_path) {
        warn!(shared = %shared_path.display(), error = %e, "failed to remove stale lock file");
        return false;
    }
    warn!(
        shared = %shared_path.display(),
        owner = %holder.owner,
        pid = holder.pid,
        "reclaimed stale lock left by a dead holder"
    );

    let mut leftover = OsString::from(shared_path.as_os_str());
    leftover.push(".");
    leftover.push(&holder.id);
    let leftover = PathBuf::from(leftover);
    if !holder.id.contains('/') && FileIdentity::of_path(&leftover).ok() == Some(held) {
        match fs::remove_file(&leftover) {
            Ok(()) => debug!(private = %leftover.display(), "removed dead holder's link file"),
            Err(e) => debug!(
                private = %leftover.display(),
                error = %e,
                "failed to remove dead holder's link file"
            ),
        }
    }
    true
}

/// Describe the lock for `target`.
///
/// # Returns
///
/// * `Ok(LockInfo)` - The lock state, identity, and holder (if recorded)
/// * `Err(LockError::Io)` - The lock file exists but cannot be examined
pub fn inspect<P: AsRef<Path>>(target: P) -> Result<LockInfo> {
    let shared = shared_path_for(target)?;

    let mut file = match File::open(&shared) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(LockInfo {
                path: shared,
                state: LockState::Free,
                identity: None,
                holder: None,
            });
        }
        Err(_) => {
            // Exists but unreadable for us: held by someone we cannot see.
            return match FileIdentity::of_path(&shared) {
                Ok(identity) => Ok(LockInfo {
                    path: shared,
                    state: LockState::Held,
                    identity: Some(identity),
                    holder: None,
                }),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(LockInfo {
                    path: shared,
                    state: LockState::Free,
                    identity: None,
                    holder: None,
                }),
                Err(e) => Err(LockError::io("stat", shared, e)),
            };
        }
    };

    let identity =
        FileIdentity::of_file(&file).map_err(|e| LockError::io("stat", &shared, e))?;
    let holder = read_holder(&mut file);
    let state = match &holder {
        Some(h) if !h.is_alive() => LockState::Stale,
        _ => LockState::Held,
    };

    Ok(LockInfo {
        path: shared,
        state,
        identity: Some(identity),
        holder,
    })
}

/// Clear the lock file for `target`.
///
/// Without `force`, only a lock whose recorded holder is dead is removed.
/// With `force`, any lock file is removed; the caller is responsible for
/// knowing that the holder has crashed.
///
/// # Returns
///
/// * `Ok(LockInfo)` - Information about the cleared lock
/// * `Err(LockError::InvalidArgument)` - No lock file, or a live/unknown holder without `force`
/// * `Err(LockError::Io)` - The lock file could not be opened or removed
pub fn clear_stale<P: AsRef<Path>>(target: P, force: bool) -> Result<LockInfo> {
    let shared = shared_path_for(target)?;

    let mut file = match OpenOptions::new().read(true).write(true).open(&shared) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LockError::InvalidArgument(format!(
                "lock '{}' does not exist",
                shared.display()
            )));
        }
        Err(e) => return Err(LockError::io("open", shared, e)),
    };

    let held = FileIdentity::of_file(&file).map_err(|e| LockError::io("stat", &shared, e))?;
    let contended = match record::try_lock(&file) {
        Ok(()) => false,
        Err(e) if record::is_contended(&e) => true,
        Err(e) => return Err(LockError::io("lock", shared, e)),
    };
    let holder = read_holder(&mut file);
    let stale = !contended && holder.as_ref().is_some_and(|h| !h.is_alive());

    if !stale && !force {
        let who = holder
            .as_ref()
            .map(|h| format!("{} (pid {})", h.owner, h.pid))
            .unwrap_or_else(|| "an unknown holder".to_string());
        return Err(LockError::InvalidArgument(format!(
            "refusing to clear lock '{}' held by {} without force",
            shared.display(),
            who
        )));
    }

    if FileIdentity::of_path(&shared).ok() != Some(held) {
        return Err(LockError::InvalidArgument(format!(
            "lock '{}' was replaced while clearing it",
            shared.display()
        )));
    }
    fs::remove_file(&shared).map_err(|e| LockError::io("remove", &shared, e))?;
    warn!(shared = %shared.display(), force, "cleared lock file");

    Ok(LockInfo {
        path: shared,
        state: if stale { LockState::Stale } else { LockState::Held },
        identity: Some(held),
        holder,
    })
}
