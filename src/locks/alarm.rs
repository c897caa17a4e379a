//! Deadline-bounded wait for a record lock.
//!
//! The blocking lock primitive has no timeout of its own, so the wait is
//! interrupted with `SIGALRM`. A watchdog thread sends the signal to the
//! waiting thread only (`pthread_kill`), which keeps concurrent waiters on
//! other threads undisturbed. The handler does nothing; its only effect is
//! that the blocked `fcntl` returns `EINTR`.
//!
//! The disposition is installed without `SA_RESTART`. The previous
//! disposition is saved when the first waiter arms and restored when the
//! last waiter disarms.

use super::record;
use std::fs::File;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// How often the watchdog repeats the signal once the deadline has passed,
/// in case the first one landed before the waiter entered the syscall.
const REARM_INTERVAL: Duration = Duration::from_millis(10);

/// Result of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitOutcome {
    /// The record lock was granted: the previous holder let go.
    Granted,
    /// The deadline passed first.
    TimedOut,
}

/// Block on the record lock of `file` until it is granted or `deadline` passes.
pub(crate) fn wait_for_record_lock(file: &File, deadline: Instant) -> io::Result<WaitOutcome> {
    if Instant::now() >= deadline {
        return Ok(WaitOutcome::TimedOut);
    }

    let _handler = HandlerGuard::install()?;
    let watchdog = Watchdog::arm(deadline)?;

    debug!("waiting for record lock");
    let outcome = loop {
        match record::lock_blocking(file) {
            Ok(()) => break Ok(WaitOutcome::Granted),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                if watchdog.fired() || Instant::now() >= deadline {
                    break Ok(WaitOutcome::TimedOut);
                }
                // Some other signal; keep waiting.
            }
            Err(e) => break Err(e),
        }
    };
    drop(watchdog);

    debug!(?outcome, "leaving record lock wait");
    outcome
}

extern "C" fn on_alarm(_signal: libc::c_int) {}

struct HandlerState {
    users: usize,
    previous: Option<libc::sigaction>,
}

static HANDLER: Mutex<HandlerState> = Mutex::new(HandlerState {
    users: 0,
    previous: None,
});

/// Keeps the no-op `SIGALRM` handler installed while alive.
struct HandlerGuard;

impl HandlerGuard {
    fn install() -> io::Result<Self> {
        let mut state = HANDLER.lock().unwrap_or_else(|poison| poison.into_inner());
        if state.users == 0 {
            // SAFETY: sigaction is plain old data; every field is set below
            // or valid when zeroed.
            let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
            action.sa_sigaction = on_alarm as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = 0;
            // SAFETY: both pointers reference live, initialized sigaction values.
            let mut previous: libc::sigaction = unsafe { std::mem::zeroed() };
            let rc = unsafe {
                libc::sigfillset(&mut action.sa_mask);
                libc::sigaction(libc::SIGALRM, &action, &mut previous)
            };
            if rc != 0 {
                return Err(io::Error::last_os_error());
            }
            state.previous = Some(previous);
        }
        state.users += 1;
        Ok(HandlerGuard)
    }
}

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        let mut state = HANDLER.lock().unwrap_or_else(|poison| poison.into_inner());
        state.users = state.users.saturating_sub(1);
        if state.users == 0
            && let Some(previous) = state.previous.take()
        {
            // SAFETY: `previous` was filled in by the kernel in `install`.
            unsafe {
                libc::sigaction(libc::SIGALRM, &previous, std::ptr::null_mut());
            }
        }
    }
}

/// Thread handle of the waiter, moved into the watchdog thread.
struct Target(libc::pthread_t);

// SAFETY: a pthread_t is an opaque id; the watchdog only passes it to
// pthread_kill while the waiter is known to be alive (it joins the watchdog
// before returning).
unsafe impl Send for Target {}

/// Sends `SIGALRM` to the arming thread once the deadline passes.
struct Watchdog {
    cancel: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
    fired: Arc<AtomicBool>,
}

impl Watchdog {
    fn arm(deadline: Instant) -> io::Result<Self> {
        // SAFETY: pthread_self has no preconditions.
        let target = Target(unsafe { libc::pthread_self() });
        let (cancel, cancelled) = mpsc::channel::<()>();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let thread = thread::Builder::new()
            .name("linklock-alarm".to_string())
            .spawn(move || {
                let target = target;
                let mut wait = deadline.saturating_duration_since(Instant::now());
                loop {
                    match cancelled.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            flag.store(true, Ordering::SeqCst);
                            // SAFETY: the waiter joins this thread before it
                            // returns, so `target` is still running.
                            unsafe {
                                libc::pthread_kill(target.0, libc::SIGALRM);
                            }
                            wait = REARM_INTERVAL;
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        Ok(Self {
            cancel: Some(cancel),
            thread: Some(thread),
            fired,
        })
    }

    fn fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        drop(self.cancel.take());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
