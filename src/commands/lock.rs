//! Implementation of the `linklock hold`, `status` and `clear` commands.

use crate::cli::{ClearArgs, HoldArgs, StatusArgs};
use crate::config::Config;
use crate::error::Result;
use crate::locks::{self, HolderMetadata, LockHandle, LockInfo, LockState};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Execute the `linklock hold` command.
///
/// Prints `locked <shared path>` once the lock is held, so scripts can wait
/// for that line before racing against the holder.
pub fn cmd_hold(args: HoldArgs, config: Config) -> Result<()> {
    let guard = LockHandle::with_config(&args.target, None, config)?.lock()?;

    println!("locked {}", guard.shared_path().display());
    if let Err(e) = io::stdout().flush() {
        debug!(error = %e, "failed to flush stdout");
    }

    thread::sleep(Duration::from_secs(args.seconds));
    guard.release();
    Ok(())
}

/// Execute the `linklock status` command.
pub fn cmd_status(args: StatusArgs) -> Result<()> {
    let info = locks::inspect(&args.target)?;

    println!("Lock for {}:", args.target.display());
    println!("  Path:       {}", info.path.display());
    println!("  State:      {}", info.state.as_str());
    if let Some(identity) = info.identity {
        println!("  Inode:      {} (dev {})", identity.ino, identity.dev);
    }
    match &info.holder {
        Some(holder) => print_holder(holder, "  "),
        None if info.state != LockState::Free => {
            println!("  Holder:     unknown (lock file carries no holder metadata)")
        }
        None => {}
    }

    if info.state == LockState::Stale {
        println!();
        println!(
            "Note: the holder is gone. Use `linklock clear {}` to remove the lock.",
            args.target.display()
        );
    }

    Ok(())
}

/// Execute the `linklock clear` command.
pub fn cmd_clear(args: ClearArgs) -> Result<()> {
    let cleared: LockInfo = locks::clear_stale(&args.target, args.force)?;

    println!("Cleared lock: {}", cleared.path.display());
    println!();
    println!("Lock details:");
    match &cleared.holder {
        Some(holder) => print_holder(holder, "  "),
        None => println!("  Holder:     unknown"),
    }
    if cleared.state == LockState::Stale {
        println!("  Status:     was STALE");
    }

    Ok(())
}

fn print_holder(holder: &HolderMetadata, indent: &str) {
    println!("{indent}Owner:      {}", holder.owner);
    println!("{indent}PID:        {}", holder.pid);
    println!("{indent}Link id:    {}", holder.id);
    println!(
        "{indent}Created:    {}",
        holder.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{indent}Age:        {}", holder.age_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn hold_releases_when_done() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("table");

        let args = HoldArgs {
            target: target.clone(),
            seconds: 0,
        };
        cmd_hold(args, Config::default()).unwrap();

        assert!(!temp_dir.path().join("table~").exists());
    }

    #[test]
    fn status_of_free_lock_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let args = StatusArgs {
            target: temp_dir.path().join("table"),
        };
        assert!(cmd_status(args).is_ok());
    }

    #[test]
    fn status_of_empty_target_is_invalid_argument() {
        let args = StatusArgs {
            target: "".into(),
        };
        let err = cmd_status(args).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::INVALID_ARGUMENT);
    }

    #[test]
    fn clear_without_lock_is_invalid_argument() {
        let temp_dir = TempDir::new().unwrap();
        let args = ClearArgs {
            target: temp_dir.path().join("table"),
            force: true,
        };
        let err = cmd_clear(args).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::INVALID_ARGUMENT);
    }

    #[test]
    fn clear_unknown_holder_requires_force() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("table");
        let shared = temp_dir.path().join("table~");
        fs::write(&shared, "").unwrap();

        let args = ClearArgs {
            target: target.clone(),
            force: false,
        };
        let err = cmd_clear(args).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::INVALID_ARGUMENT);
        assert!(shared.exists());

        let args = ClearArgs {
            target,
            force: true,
        };
        cmd_clear(args).unwrap();
        assert!(!shared.exists());
    }
}
