//! The acquire protocol.
//!
//! Locking scheme:
//!
//! 1. create the private link file (`target~.<id>`)
//! 2. link it to the shared lock path (`target~.<id>` -> `target~`)
//! 3. a) link succeeded: take a non-blocking record lock, done
//!    b) link failed with EEXIST: wait (bounded) on the record lock of the
//!       current lock file, then go to 2
//!
//! Only the link decides ownership; it is atomic, so exactly one contender
//! wins it. The record lock lets losers sleep until the holder closes the
//! lock file instead of polling. Deleting a plain lock file on release would
//! be racy: a third contender could recreate it between two others' views
//! of "unlocked", so a contender only proceeds if it made the link itself.

use super::alarm::{self, WaitOutcome};
use super::handle::LockHandle;
use super::metadata::HolderMetadata;
use super::operations::reclaim_if_dead;
use super::record;
use super::types::FileIdentity;
use crate::error::{LockError, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Stand-in deadline for timeouts too large to add to an `Instant`.
const FOREVER: Duration = Duration::from_secs(365 * 24 * 60 * 60);

impl LockHandle {
    /// Acquire the lock, blocking for at most the configured timeout.
    ///
    /// Calling this on a handle that already holds the lock is a no-op.
    /// On failure the handle is released, so no private link file, open
    /// descriptor or claim on the shared lock file is left behind.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - This handle is now the exclusive holder
    /// * `Err(LockError::ResourceUnavailable)` - The private link file could not be created
    /// * `Err(LockError::TimedOut)` - Another holder kept the lock until the deadline
    /// * `Err(LockError::Io)` - Any other system failure
    pub fn acquire(&mut self) -> Result<()> {
        if self.owned {
            return Ok(());
        }

        let result = self.run_protocol();
        if result.is_err() {
            self.release();
        }
        result
    }

    fn run_protocol(&mut self) -> Result<()> {
        self.prepare_link_file()?;

        let started = Instant::now();
        let deadline = started
            .checked_add(self.config.timeout())
            .unwrap_or_else(|| started + FOREVER);

        // Repeat until it was us who made the link.
        loop {
            match fs::hard_link(&self.private_path, &self.shared_path) {
                Ok(()) => {
                    self.owned = true;
                    debug!(shared = %self.shared_path.display(), "link created");
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(LockError::io("link", &self.shared_path, e)),
            }

            let descriptor = match OpenOptions::new().write(true).open(&self.shared_path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::NotFound && Instant::now() < deadline => {
                    // Released between our link attempt and the open.
                    self.owned = false;
                    continue;
                }
                Err(e) => {
                    // Ownership is re-proven by inode in release.
                    self.owned = false;
                    return Err(LockError::io("open", &self.shared_path, e));
                }
            };

            if self.owned {
                if let Err(e) = record::try_lock(&descriptor) {
                    // A waiter may lock the fresh inode before we do.
                    debug!(
                        shared = %self.shared_path.display(),
                        error = %e,
                        "cannot take record lock on our own lock file; proceeding since the link is ours"
                    );
                }
                self.descriptor = Some(descriptor);
                break;
            }

            match alarm::wait_for_record_lock(&descriptor, deadline) {
                Ok(WaitOutcome::Granted) => {
                    if self.config.reclaim_stale && reclaim_if_dead(&self.shared_path, &descriptor)
                    {
                        continue;
                    }
                    thread::sleep(self.config.retry_delay());
                }
                Ok(WaitOutcome::TimedOut) => {
                    debug!(
                        shared = %self.shared_path.display(),
                        "can't create link: time out (perhaps there is a stale lock file?)"
                    );
                    return Err(LockError::TimedOut {
                        path: self.shared_path.clone(),
                        waited: started.elapsed(),
                    });
                }
                Err(e) => {
                    return Err(LockError::io(
                        "wait for record lock on",
                        &self.shared_path,
                        e,
                    ));
                }
            }
        }

        debug!(shared = %self.shared_path.display(), pid = std::process::id(), "successfully locked");
        if let Err(e) = fs::remove_file(&self.private_path)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(
                private = %self.private_path.display(),
                error = %e,
                "failed to remove link file"
            );
        }
        Ok(())
    }

    /// Create the private link file and remember its identity.
    pub(super) fn prepare_link_file(&mut self) -> Result<()> {
        let unavailable = |source: io::Error| LockError::ResourceUnavailable {
            path: self.private_path.clone(),
            source,
        };

        // A leftover from a crashed attempt with the same id may still be
        // linked to a stale lock file; never reuse its inode.
        match fs::remove_file(&self.private_path) {
            Ok(()) => debug!(private = %self.private_path.display(), "removed leftover link file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(unavailable(e)),
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.private_path)
            .map_err(unavailable)?;

        let identity = FileIdentity::of_file(&file).map_err(unavailable)?;
        self.link_identity = Some(identity);

        if self.config.record_holder {
            let json = HolderMetadata::new(&self.id).to_json()?;
            file.write_all(json.as_bytes()).map_err(unavailable)?;
        }

        Ok(())
    }
}
