//! Error types for netloy commands.
//!
//! Wraps the bundler's errors together with command line failures and
//! offers actionable recovery suggestions for the common ones.

use crate::bundler::Error as BundlerError;
use thiserror::Error;

/// Result type alias for netloy commands
pub type Result<T> = std::result::Result<T, NetloyError>;

/// Main error type for all netloy commands
#[derive(Error, Debug)]
pub enum NetloyError {
    /// Bundler errors
    #[error("{0}")]
    Bundler(#[from] BundlerError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

fn root_cause(error: &BundlerError) -> &BundlerError {
    match error {
        BundlerError::Context(_, inner) => root_cause(inner),
        other => other,
    }
}

impl NetloyError {
    /// Whether the user declined a confirmation or interrupted a tool.
    pub fn is_cancelled(&self) -> bool {
        match self {
            NetloyError::Bundler(e) => {
                e.is_cancelled() || matches!(root_cause(e), BundlerError::Cancelled(_))
            }
            _ => false,
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        let NetloyError::Bundler(error) = self else {
            return vec!["Run with --help to see the accepted arguments".to_string()];
        };

        match root_cause(error) {
            BundlerError::ValidationFailed(_) => vec![
                "Fix every listed key in the configuration file".to_string(),
                "Run `netloy upgrade <conf>` if the file predates the current key set".to_string(),
            ],
            BundlerError::NotFound { what, .. } => vec![
                format!("Check that the {what} exists"),
                "Relative paths are resolved against the configuration file's directory"
                    .to_string(),
            ],
            BundlerError::ExternalToolFailed { tool, .. } => vec![
                format!("Review the {tool} output above"),
                "Re-run with --verbose to see the full command line".to_string(),
            ],
            BundlerError::CommandFailed { .. } => vec![
                "Install the packaging tool and make sure it is on the PATH".to_string(),
                "Run `netloy check <conf> --kind <kind>` to list missing tools".to_string(),
            ],
            BundlerError::UnsupportedPlatform(_) => vec![
                "Build this kind on a host of the matching operating system".to_string(),
                "Pass --runtime with a runtime identifier valid for the kind".to_string(),
            ],
            BundlerError::TimedOut { .. } => {
                vec!["Increase --timeout or omit it to wait indefinitely".to_string()]
            }
            _ => vec![],
        }
    }
}
