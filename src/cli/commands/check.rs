//! Check command implementation.
//!
//! Parses and validates the configuration, then checks that the host can
//! build the requested kind and that its tools are installed. Nothing is
//! created: a missing output directory is reported, not made.

use crate::bundler::{BuildOptions, Bundler, Interaction, SystemRunner, settings::parser};
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{CliError, Result};
use std::sync::Arc;

/// Execute check command
pub(super) async fn execute_check(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Check { conf, kind, runtime } = &args.command else {
        return Err(CliError::ExecutionFailed {
            command: "check".to_string(),
            reason: "Invalid command type".to_string(),
        }
        .into());
    };

    let interaction = Interaction::declining();
    let settings = parser::parse(conf, &interaction).await?;

    let mut options = BuildOptions::new(*kind);
    options.runtime = *runtime;
    let bundler = Bundler::new(settings, options, interaction, Arc::new(SystemRunner::default()))?;
    bundler.validate().await?;

    config.success_println(&format!(
        "{} is ready to build {} for {}",
        conf.display(),
        kind,
        bundler.runtime()
    ));
    Ok(())
}
