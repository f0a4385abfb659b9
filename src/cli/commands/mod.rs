//! Command execution.
//!
//! Each command returns a [`Result`]; this module reports failures and maps
//! them to exit codes: 0 on success, 1 on failure, 2 when the user declined
//! a confirmation or interrupted the build.

mod build;
mod check;
mod config_file;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use tokio_util::sync::CancellationToken;

use build::execute_build;
use check::execute_check;
use config_file::{execute_new, execute_upgrade};

/// Exit code for a cancelled command.
pub const EXIT_CANCELLED: i32 = 2;

/// Execute the command named by `args`
pub async fn execute_command(args: Args, cancel: CancellationToken) -> i32 {
    let config = RuntimeConfig::from(&args);

    if let Err(validation_error) = args.validate() {
        config.error_println(&format!("Invalid arguments: {validation_error}"));
        return 1;
    }

    let result: Result<()> = match &args.command {
        Command::Build { .. } => execute_build(&args, &config, cancel).await,
        Command::New { .. } => execute_new(&args, &config).await,
        Command::Upgrade { .. } => execute_upgrade(&args, &config).await,
        Command::Check { .. } => execute_check(&args, &config).await,
    };

    match result {
        Ok(()) => 0,
        Err(e) if e.is_cancelled() => {
            config.warning_println(&format!("Command '{}' cancelled: {e}", args.command.name()));
            EXIT_CANCELLED
        }
        Err(e) => {
            config.error_println(&format!("Command '{}' failed: {e}", args.command.name()));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                config.println("\nRecovery suggestions:");
                for suggestion in suggestions {
                    config.indent(&format!("• {suggestion}"));
                }
            }
            1
        }
    }
}
