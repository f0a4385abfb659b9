//! Command line argument parsing and validation.

use crate::bundler::{PackageType, Runtime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Package published .NET applications as native installers
#[derive(Parser, Debug)]
#[command(
    name = "netloy",
    version,
    about = "Package published .NET applications as native installers",
    long_about = "Publish a .NET project and package it as a native installer or archive,
driven by a single .netloy configuration file.

Usage:
  netloy new app.netloy
  netloy check app.netloy --kind deb
  netloy build app.netloy --kind appimage --runtime linux-arm64 -y"
)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish the project and build one package
    Build {
        /// Configuration file
        #[arg(value_name = "CONF")]
        conf: PathBuf,

        /// Package kind (deb, rpm, pacman, appimage, flatpak, app, dmg, exe, msi, portable)
        #[arg(short, long, value_parser = parse_kind)]
        kind: PackageType,

        /// .NET runtime identifier, such as linux-x64 or win-arm64
        #[arg(short, long, value_parser = parse_runtime)]
        runtime: Option<Runtime>,

        /// Build configuration passed to dotnet publish
        #[arg(short = 'c', long, default_value = "Release")]
        build_config: String,

        /// Output file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Answer yes to every confirmation
        #[arg(short = 'y', long, env = "NETLOY_UNATTENDED")]
        unattended: bool,

        /// Delete the temporary build tree after a successful build
        #[arg(long)]
        clean: bool,

        /// Kill external tools running longer than this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Write a new configuration file with default values
    New {
        /// Configuration file to create
        #[arg(value_name = "CONF")]
        conf: PathBuf,

        /// Include a comment above every key
        #[arg(long)]
        verbose_comments: bool,
    },

    /// Rewrite a configuration file with the current key set
    Upgrade {
        /// Configuration file to rewrite
        #[arg(value_name = "CONF")]
        conf: PathBuf,

        /// Include a comment above every key
        #[arg(long)]
        verbose_comments: bool,
    },

    /// Validate the configuration and tools for one package kind
    Check {
        /// Configuration file
        #[arg(value_name = "CONF")]
        conf: PathBuf,

        /// Package kind to check for
        #[arg(short, long, value_parser = parse_kind)]
        kind: PackageType,

        /// .NET runtime identifier
        #[arg(short, long, value_parser = parse_runtime)]
        runtime: Option<Runtime>,
    },
}

impl Command {
    /// Name shown in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Build { .. } => "build",
            Command::New { .. } => "new",
            Command::Upgrade { .. } => "upgrade",
            Command::Check { .. } => "check",
        }
    }
}

fn parse_kind(value: &str) -> Result<PackageType, String> {
    value.parse().map_err(|e: crate::bundler::Error| e.to_string())
}

fn parse_runtime(value: &str) -> Result<Runtime, String> {
    value.parse().map_err(|e: crate::bundler::Error| e.to_string())
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Command::Build { build_config, timeout, .. } = &self.command {
            if build_config.trim().is_empty() {
                return Err("--build-config must not be empty".to_string());
            }
            if *timeout == Some(0) {
                return Err("--timeout must be at least one second".to_string());
            }
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, quiet),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.verbose, args.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn build_parses_kind_and_runtime() {
        let args = Args::try_parse_from([
            "netloy", "build", "app.netloy", "--kind", "deb", "-r", "linux-arm64", "-y",
        ])
        .unwrap();
        let Command::Build { kind, runtime, unattended, build_config, .. } = args.command else {
            panic!("expected build");
        };
        assert_eq!(kind, PackageType::Deb);
        assert_eq!(runtime.unwrap().to_string(), "linux-arm64");
        assert!(unattended);
        assert_eq!(build_config, "Release");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(Args::try_parse_from(["netloy", "build", "a.netloy", "--kind", "snap"]).is_err());
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let args =
            Args::try_parse_from(["netloy", "build", "a.netloy", "-k", "rpm", "--timeout", "0"])
                .unwrap();
        assert!(args.validate().is_err());
    }
}
