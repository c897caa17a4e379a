//! The release protocol.

use super::handle::LockHandle;
use super::types::FileIdentity;
use std::fs;
use std::io;
use tracing::{debug, warn};

impl LockHandle {
    /// Release the lock.
    ///
    /// Safe to call in every state: after a successful acquire, after a
    /// failed or interrupted one, on a handle that never acquired, and
    /// repeatedly. Never fails and never blocks.
    pub fn release(&mut self) {
        if !self.owned && self.holds_link() {
            // The link was made but ownership was never recorded, e.g.
            // because acquire was interrupted right after link().
            debug!(shared = %self.shared_path.display(), "recovered ownership from inode identity");
            self.owned = true;
        }

        if self.owned || self.descriptor.is_some() || self.link_identity.is_some() {
            debug!(
                shared = %self.shared_path.display(),
                "{}",
                if self.owned { "unlocking" } else { "cleaning" }
            );
        }

        remove_quietly(&self.private_path);
        drop(self.descriptor.take());
        if self.owned {
            remove_quietly(&self.shared_path);
        }

        self.owned = false;
        self.link_identity = None;
    }

    /// Whether the shared lock path is the very inode this handle created as
    /// its private link file.
    ///
    /// The private file must still exist with the recorded identity; while
    /// it does, its inode number cannot have been reused.
    fn holds_link(&self) -> bool {
        let Some(identity) = self.link_identity else {
            return false;
        };
        matches!(FileIdentity::of_path(&self.private_path), Ok(id) if id == identity)
            && matches!(FileIdentity::of_path(&self.shared_path), Ok(id) if id == identity)
    }
}

fn remove_quietly(path: &std::path::Path) {
    if let Err(e) = fs::remove_file(path)
        && e.kind() != io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "failed to remove lock artifact");
    }
}
