//! Command line interface for netloy.
//!
//! Parses arguments, runs the requested command and turns its outcome into
//! colored output and a process exit code.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use tokio_util::sync::CancellationToken;

/// Main CLI entry point
///
/// `cancel` is triggered when the user interrupts the process; running
/// tools are killed and the command reports a cancellation.
pub async fn run(args: Args, cancel: CancellationToken) -> i32 {
    execute_command(args, cancel).await
}
