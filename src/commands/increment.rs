//! Implementation of the `linklock increment` command.
//!
//! Each loop takes the lock for the data file, reads the counter, writes it
//! back incremented and releases. With several processes running against
//! the same file, any lost update shows up as a final count below the total
//! number of loops.

use crate::cli::IncrementArgs;
use crate::config::Config;
use crate::error::{LockError, Result};
use crate::locks::LockHandle;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Pause between loops of synchronized runs so the contenders interleave.
const SYNC_PAUSE: Duration = Duration::from_millis(25);

/// Execute the `linklock increment` command.
pub fn cmd_increment(args: IncrementArgs, config: Config) -> Result<()> {
    let mut handle = LockHandle::with_config(&args.datafile, args.id.as_deref(), config)?;

    if let Some(synctime) = args.synctime {
        wait_until(synctime)?;
    }

    let started = Instant::now();
    for _ in 0..args.loops {
        handle.acquire()?;
        let result = increment_once(&args.datafile);
        handle.release();
        result?;

        if args.synctime.is_some() {
            thread::sleep(SYNC_PAUSE);
        }
    }

    debug!(
        id = %handle.id(),
        loops = args.loops,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "done"
    );
    Ok(())
}

/// Read the counter from `path` and write it back incremented.
///
/// An empty file counts as zero.
fn increment_once(path: &Path) -> Result<u64> {
    let content = fs::read_to_string(path).map_err(|e| LockError::io("read", path, e))?;
    let trimmed = content.trim();
    let value = if trimmed.is_empty() {
        0
    } else {
        trimmed.parse::<u64>().map_err(|_| {
            LockError::InvalidArgument(format!(
                "'{}' does not contain a counter: {:?}",
                path.display(),
                trimmed
            ))
        })?
    };

    let next = value.checked_add(1).ok_or_else(|| {
        LockError::InvalidArgument(format!("counter in '{}' would overflow", path.display()))
    })?;
    fs::write(path, format!("{}\n", next)).map_err(|e| LockError::io("write", path, e))?;
    Ok(next)
}

/// Sleep until the given unix time (seconds).
fn wait_until(synctime: i64) -> Result<()> {
    let start = DateTime::<Utc>::from_timestamp(synctime, 0).ok_or_else(|| {
        LockError::InvalidArgument(format!("synctime {} is out of range", synctime))
    })?;

    match (start - Utc::now()).to_std() {
        Ok(delay) => {
            debug!(delay_ms = delay.as_millis() as u64, "waiting for synchronized start");
            thread::sleep(delay);
        }
        Err(_) => warn!(synctime, "synchronized start time has already passed"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args(datafile: PathBuf, loops: u32) -> IncrementArgs {
        IncrementArgs {
            datafile,
            loops,
            synctime: None,
            id: None,
        }
    }

    #[test]
    fn increments_counter_once_per_loop() {
        let temp_dir = TempDir::new().unwrap();
        let datafile = temp_dir.path().join("counter");
        fs::write(&datafile, "7\n").unwrap();

        cmd_increment(args(datafile.clone(), 5), Config::default()).unwrap();

        assert_eq!(fs::read_to_string(&datafile).unwrap().trim(), "12");
        assert!(!temp_dir.path().join("counter~").exists());
    }

    #[test]
    fn empty_file_counts_as_zero() {
        let temp_dir = TempDir::new().unwrap();
        let datafile = temp_dir.path().join("counter");
        fs::write(&datafile, "").unwrap();

        assert_eq!(increment_once(&datafile).unwrap(), 1);
    }

    #[test]
    fn garbage_counter_is_invalid_argument() {
        let temp_dir = TempDir::new().unwrap();
        let datafile = temp_dir.path().join("counter");
        fs::write(&datafile, "many").unwrap();

        let err = cmd_increment(args(datafile, 1), Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::INVALID_ARGUMENT);
        assert!(!temp_dir.path().join("counter~").exists());
    }

    #[test]
    fn missing_datafile_is_io_failure() {
        let temp_dir = TempDir::new().unwrap();
        let datafile = temp_dir.path().join("counter");

        let err = cmd_increment(args(datafile, 1), Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::IO_FAILURE);
    }

    #[test]
    fn overflowing_counter_is_invalid_argument() {
        let temp_dir = TempDir::new().unwrap();
        let datafile = temp_dir.path().join("counter");
        fs::write(&datafile, u64::MAX.to_string()).unwrap();

        let err = cmd_increment(args(datafile.clone(), 1), Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::INVALID_ARGUMENT);
        assert!(err.to_string().contains("overflow"));
        assert_eq!(fs::read_to_string(&datafile).unwrap(), u64::MAX.to_string());
        assert!(!temp_dir.path().join("counter~").exists());
    }

    #[test]
    fn past_synctime_starts_immediately() {
        let temp_dir = TempDir::new().unwrap();
        let datafile = temp_dir.path().join("counter");
        fs::write(&datafile, "0").unwrap();

        let mut args = args(datafile.clone(), 2);
        args.synctime = Some(Utc::now().timestamp() - 60);
        args.id = Some("sync".to_string());

        let started = Instant::now();
        cmd_increment(args, Config::default()).unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(fs::read_to_string(&datafile).unwrap().trim(), "2");
    }

    #[test]
    fn bad_id_is_invalid_argument() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = args(temp_dir.path().join("counter"), 1);
        args.id = Some("a/b".to_string());

        let err = cmd_increment(args, Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::INVALID_ARGUMENT);
    }
}
