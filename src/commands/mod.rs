//! Command implementations for linklock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod increment;
mod lock;

use crate::cli::Command;
use crate::config::Config;
use crate::error::Result;

pub use increment::cmd_increment;
pub use lock::{cmd_clear, cmd_hold, cmd_status};

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. Each command
/// is routed to its handler function.
pub fn dispatch(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Increment(args) => cmd_increment(args, config),
        Command::Hold(args) => cmd_hold(args, config),
        Command::Status(args) => cmd_status(args),
        Command::Clear(args) => cmd_clear(args),
    }
}
