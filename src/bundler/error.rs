//! Error types for bundler operations.
//!
//! Provides contextual error chaining, filesystem errors that carry the
//! offending path, and the outcome variants every build stage reports:
//! missing inputs, aggregate validation failures, failed external tools,
//! user cancellation and unsupported host/target combinations.
//!
//! # Features
//!
//! - **Context trait**: Add context to errors similar to anyhow
//! - **ErrorExt trait**: Filesystem operations with automatic path context
//! - **bail! macro**: Early return with formatted error messages
//!
//! # Example
//!
//! ```no_run
//! use netloy::bundler::{Context, ErrorExt, Result};
//! use std::path::Path;
//!
//! fn read_script(path: &Path) -> Result<String> {
//!     let text = std::fs::read_to_string(path)
//!         .fs_context("reading post-publish script", path)?;
//!
//!     if text.trim().is_empty() {
//!         netloy::bail!("post-publish script {} is empty", path.display());
//!     }
//!
//!     Ok(text)
//! }
//! ```

use std::{
    fmt::{self, Display},
    io,
    path::{self, PathBuf},
};
use thiserror::Error as DeriveError;

/// Errors returned by the bundler.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Context describing the operation (e.g., "reading config file")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// A required input file or directory does not exist.
    #[error("{what} not found: {}", path.display())]
    NotFound {
        /// Human readable name of the missing input
        what: String,
        /// Path that was looked up
        path: PathBuf,
    },

    /// One or more configuration values are invalid.
    ///
    /// Every problem found during a validation pass is collected into a
    /// single error so the user can fix them all at once.
    #[error("{}", ValidationList(.0))]
    ValidationFailed(Vec<String>),

    /// Child process could not be spawned.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Command that failed to execute
        command: String,
        /// The underlying error
        error: io::Error,
    },

    /// External tool ran but exited unsuccessfully.
    #[error("{tool} failed with exit code {}:\n{output}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    ExternalToolFailed {
        /// Program name
        tool: String,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Captured stderr, or stdout when stderr was empty
        output: String,
    },

    /// The user declined a confirmation.
    #[error("cancelled: {0}")]
    UserCancelled(String),

    /// Format, host or runtime combination that cannot be built.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// External tool was cancelled through its cancellation token.
    #[error("{0} was cancelled")]
    Cancelled(String),

    /// External tool exceeded its time limit.
    #[error("{tool} timed out after {seconds}s")]
    TimedOut {
        /// Program name
        tool: String,
        /// Configured limit
        seconds: u64,
    },

    /// Generic I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Image header decoding error (icon size checks).
    #[error("{0}")]
    ImageError(#[from] image::ImageError),

    /// Error walking directory.
    #[error("{0}")]
    WalkdirError(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error("{0}")]
    StripError(#[from] path::StripPrefixError),

    /// Handlebars template rendering error.
    #[error("{0}")]
    HandleBarsError(#[from] handlebars::RenderError),

    /// Handlebars template parsing error.
    #[error("{0}")]
    Template(#[from] handlebars::TemplateError),

    /// JSON serialization error (template contexts).
    #[error("{0}")]
    JsonError(#[from] serde_json::error::Error),

    /// Regular expression error.
    #[error("{0}")]
    RegexError(#[from] regex::Error),

    /// Invalid glob pattern (project discovery).
    #[error("{0}")]
    GlobPattern(#[from] glob::PatternError),

    /// Property list writing error.
    #[error("{0}")]
    Plist(#[from] plist::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    GenericError(String),
}

struct ValidationList<'a>(&'a [String]);

impl Display for ValidationList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration is invalid ({} problems):", self.0.len())?;
        for item in self.0 {
            write!(f, "\n  * {item}")?;
        }
        Ok(())
    }
}

impl Error {
    /// Returns `true` when this error, or any error it wraps, is a user cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::UserCancelled(_) => true,
            Error::Context(_, inner) => inner.is_cancelled(),
            _ => false,
        }
    }
}

/// Convenient type alias for Result.
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for adding context to errors.
///
/// Similar to `anyhow::Context` but integrated with bundler's Error type.
/// Works with both `Result<T, E>` and `Option<T>`.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying icon".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Macro for early return with error.
///
/// Converts the message into a [`Error::GenericError`] and returns immediately.
///
/// # Examples
///
/// ```ignore
/// bail!("operation failed");
/// bail!("invalid value: {}", value);
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::bundler::Error::GenericError($err.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failed_lists_every_problem() {
        let err = Error::ValidationFailed(vec![
            "AppBaseName is required".into(),
            "AppId is required".into(),
            "AppVersionRelease is invalid".into(),
        ]);
        let text = err.to_string();
        assert_eq!(text.lines().filter(|l| l.trim_start().starts_with('*')).count(), 3);
        assert!(text.contains("AppId is required"));
    }

    #[test]
    fn cancellation_is_seen_through_context() {
        let err: Result<()> = Err(Error::UserCancelled("delete publish output".into()));
        let err = err.context("publishing").unwrap_err();
        assert!(err.is_cancelled());
        assert!(!Error::GenericError("x".into()).is_cancelled());
    }

    #[test]
    fn tool_failure_carries_output() {
        let err = Error::ExternalToolFailed {
            tool: "dpkg-deb".into(),
            code: Some(2),
            output: "bad control file".into(),
        };
        let text = err.to_string();
        assert!(text.contains("dpkg-deb"));
        assert!(text.contains("exit code 2"));
        assert!(text.contains("bad control file"));
    }
}
