//! Packaging of published .NET applications into native installers.
//!
//! A build is driven by a `.netloy` configuration file. The bundler publishes
//! the project with `dotnet publish`, stages the output into the directory
//! layout the target format expects, generates the format's manifest and
//! hands the tree to the native packaging tool.
//!
//! # Configuration
//!
//! Configuration files are flat `Key = Value` files:
//!
//! ```text
//! AppBaseName = HelloWorld
//! AppFriendlyName = Hello World
//! AppId = com.example.helloworld
//! AppVersionRelease = 1.0.0[1]
//! PublisherName = Example Inc.
//! ```
//!
//! Values may reference `${MACRO}` tokens, which are expanded per build.
//!
//! # Supported Formats
//!
//! | Host | Formats | Tool |
//! |------|---------|------|
//! | Linux | .deb, .rpm, .pkg.tar.zst, AppImage, .flatpak | dpkg-deb, rpmbuild, makepkg, appimagetool, flatpak-builder |
//! | macOS | .app.zip, .dmg | ditto, hdiutil |
//! | Windows | .exe, .msi | Inno Setup, WiX |
//! | any | .tar.gz / .zip | tar, zip |

#![warn(missing_docs)]

mod builder;
pub mod context;
mod error;
pub mod factory;
mod interaction;
pub mod macros;
pub mod platform;
mod publish;
pub mod resources;
pub mod settings;
pub mod utils;

// Public re-exports
pub use builder::Bundler;
pub use context::{BuildContext, BuildOptions};
pub use error::{Context, Error, ErrorExt, Result};
pub use factory::Host;
pub use interaction::{Decider, Interaction};
pub use macros::{MacroId, MacroRegistry};
pub use platform::{Arch, OsFamily, PackageType, Runtime};
pub use settings::Configuration;
pub use utils::process::{SystemRunner, ToolInvocation, ToolOutput, ToolRunner};

/// A package produced by a successful build.
///
/// # Examples
///
/// ```no_run
/// use netloy::bundler::{BuildOptions, Bundler, Configuration, Interaction, PackageType, SystemRunner};
/// use std::sync::Arc;
///
/// # async fn example(config: Configuration) -> netloy::bundler::Result<()> {
/// let bundler = Bundler::new(
///     config,
///     BuildOptions::new(PackageType::Portable),
///     Interaction::unattended(),
///     Arc::new(SystemRunner::default()),
/// )?;
/// let artifact = bundler.build().await?;
///
/// println!("Created {}: {} bytes", artifact.package_type, artifact.size);
/// println!("SHA256: {}", artifact.checksum);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BundledArtifact {
    /// The format that was built.
    pub package_type: PackageType,

    /// Files written to the output location; the package itself comes first.
    pub paths: Vec<std::path::PathBuf>,

    /// Size of the package in bytes.
    pub size: u64,

    /// SHA-256 checksum of the package, lowercase hex.
    pub checksum: String,
}
