//! CLI argument parsing for linklock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Linklock: cross-process file locking through hard-link handshakes.
///
/// Every writer of a target file links a private file to `<target>~`; the
/// one whose link succeeds holds the lock, the others sleep on a record lock
/// until it is released or their deadline passes.
#[derive(Parser, Debug)]
#[command(name = "linklock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML configuration file (timeouts, holder recording, stale reclaim).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log every protocol step to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for linklock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Increment the integer stored in a file, once per loop, under the lock.
    ///
    /// Run several of these concurrently against one file; the final value
    /// equals the total number of loops only if the lock is exclusive.
    Increment(IncrementArgs),

    /// Acquire the lock for a target and hold it for a while.
    ///
    /// Useful for manual testing and for simulating a crashed holder.
    Hold(HoldArgs),

    /// Show the state of the lock for a target.
    Status(StatusArgs),

    /// Clear a stale lock file.
    ///
    /// Only locks whose recorded holder is dead are cleared unless --force
    /// is given.
    Clear(ClearArgs),
}

/// Arguments for the `increment` command.
#[derive(Parser, Debug)]
pub struct IncrementArgs {
    /// File holding the counter.
    pub datafile: PathBuf,

    /// Number of increments to perform.
    pub loops: u32,

    /// Unix time (seconds) at which to start, to line up several processes.
    #[arg(long, value_name = "UNIX_SECONDS")]
    pub synctime: Option<i64>,

    /// Private link id to use instead of the default one.
    #[arg(long)]
    pub id: Option<String>,
}

/// Arguments for the `hold` command.
#[derive(Parser, Debug)]
pub struct HoldArgs {
    /// File whose lock should be held.
    pub target: PathBuf,

    /// How long to hold the lock.
    #[arg(long, default_value_t = 10)]
    pub seconds: u64,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// File whose lock should be inspected.
    pub target: PathBuf,
}

/// Arguments for the `clear` command.
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// File whose lock should be cleared.
    pub target: PathBuf,

    /// Clear the lock even if its holder is alive or unknown.
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_increment_minimal() {
        let cli = Cli::try_parse_from(["linklock", "increment", "/tmp/counter", "100"]).unwrap();
        if let Command::Increment(args) = cli.command {
            assert_eq!(args.datafile, PathBuf::from("/tmp/counter"));
            assert_eq!(args.loops, 100);
            assert!(args.synctime.is_none());
            assert!(args.id.is_none());
        } else {
            panic!("Expected Increment command");
        }
    }

    #[test]
    fn parse_increment_full() {
        let cli = Cli::try_parse_from([
            "linklock",
            "increment",
            "/tmp/counter",
            "5",
            "--synctime",
            "1700000000",
            "--id",
            "worker-1",
        ])
        .unwrap();
        if let Command::Increment(args) = cli.command {
            assert_eq!(args.loops, 5);
            assert_eq!(args.synctime, Some(1_700_000_000));
            assert_eq!(args.id.as_deref(), Some("worker-1"));
        } else {
            panic!("Expected Increment command");
        }
    }

    #[test]
    fn parse_increment_rejects_negative_loops() {
        assert!(Cli::try_parse_from(["linklock", "increment", "/tmp/counter", "-1"]).is_err());
    }

    #[test]
    fn parse_hold_default_seconds() {
        let cli = Cli::try_parse_from(["linklock", "hold", "/etc/mtab"]).unwrap();
        if let Command::Hold(args) = cli.command {
            assert_eq!(args.target, PathBuf::from("/etc/mtab"));
            assert_eq!(args.seconds, 10);
        } else {
            panic!("Expected Hold command");
        }
    }

    #[test]
    fn parse_status() {
        let cli = Cli::try_parse_from(["linklock", "status", "/etc/mtab"]).unwrap();
        assert!(matches!(cli.command, Command::Status(_)));
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_clear_force() {
        let cli = Cli::try_parse_from(["linklock", "clear", "/etc/mtab", "--force"]).unwrap();
        if let Command::Clear(args) = cli.command {
            assert!(args.force);
        } else {
            panic!("Expected Clear command");
        }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "linklock",
            "status",
            "/etc/mtab",
            "-v",
            "--config",
            "/etc/linklock.yaml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/linklock.yaml")));
    }
}
