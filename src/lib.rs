//! # netloy
//!
//! Packages published .NET applications as native installers and archives
//! for Linux, macOS and Windows from one declarative `.netloy` file.
//!
//! ## Usage
//!
//! ```bash
//! netloy new app.netloy                          # Write a default configuration
//! netloy check app.netloy --kind rpm             # Validate settings and tools
//! netloy build app.netloy --kind deb -y          # Publish and package
//! netloy build app.netloy --kind msi -r win-arm64
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bundler;
pub mod cli;
pub mod error;

pub use bundler::{BuildOptions, BundledArtifact, Bundler, Configuration, PackageType, Runtime};
pub use cli::Args;
pub use error::{CliError, NetloyError, Result};
