//! Whole-file advisory write locks.
//!
//! Linux uses open-file-description locks: they conflict with classic POSIX
//! record locks held by other processes, and they also conflict between
//! descriptors opened by different threads of one process. Other Unix
//! systems fall back to classic `F_SETLK`/`F_SETLKW`.

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;

#[cfg(target_os = "linux")]
const SET_LOCK: libc::c_int = libc::F_OFD_SETLK;
#[cfg(target_os = "linux")]
const SET_LOCK_WAIT: libc::c_int = libc::F_OFD_SETLKW;

#[cfg(not(target_os = "linux"))]
const SET_LOCK: libc::c_int = libc::F_SETLK;
#[cfg(not(target_os = "linux"))]
const SET_LOCK_WAIT: libc::c_int = libc::F_SETLKW;

fn whole_file_write_lock() -> libc::flock {
    // SAFETY: flock is plain old data; all-zero is a valid value and leaves
    // l_pid at 0 as OFD locks require.
    let mut fl: libc::flock = unsafe { std::mem::zeroed() };
    fl.l_type = libc::F_WRLCK as _;
    fl.l_whence = libc::SEEK_SET as _;
    fl.l_start = 0;
    fl.l_len = 0;
    fl
}

fn set_lock(file: &File, cmd: libc::c_int) -> io::Result<()> {
    let fl = whole_file_write_lock();
    // SAFETY: the descriptor belongs to `file`, which outlives the call, and
    // `fl` is a fully initialized flock.
    let rc = unsafe { libc::fcntl(file.as_raw_fd(), cmd, &fl as *const libc::flock) };
    if rc == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Try to take the write lock without waiting.
///
/// Fails with `EAGAIN`/`EACCES` when somebody else holds a conflicting lock.
pub(crate) fn try_lock(file: &File) -> io::Result<()> {
    set_lock(file, SET_LOCK)
}

/// Take the write lock, blocking until it is granted.
///
/// A single call: an interrupting signal surfaces as `ErrorKind::Interrupted`
/// and the caller decides whether to retry.
pub(crate) fn lock_blocking(file: &File) -> io::Result<()> {
    set_lock(file, SET_LOCK_WAIT)
}

/// Whether an error from `try_lock` only means "held by someone else".
pub(crate) fn is_contended(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(code) if code == libc::EAGAIN || code == libc::EACCES
    )
}
