//! Build command implementation.

use crate::bundler::{
    BuildOptions, Bundler, Interaction, SystemRunner, settings::parser,
};
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{CliError, Result};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

/// Execute build command
pub(super) async fn execute_build(
    args: &Args,
    config: &RuntimeConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let Command::Build {
        conf,
        kind,
        runtime,
        build_config,
        output,
        unattended,
        clean,
        timeout,
    } = &args.command
    else {
        return Err(CliError::ExecutionFailed {
            command: "build".to_string(),
            reason: "Invalid command type".to_string(),
        }
        .into());
    };

    let interaction = Interaction::terminal(*unattended);
    let settings = parser::parse(conf, &interaction).await?;

    let mut options = BuildOptions::new(*kind);
    options.runtime = *runtime;
    options.build_config = build_config.clone();
    options.output = output.clone();
    options.clean = *clean;

    let runner = SystemRunner::new(cancel).with_timeout(timeout.map(Duration::from_secs));
    let bundler = Bundler::new(settings, options, interaction, Arc::new(runner))?;

    let _ = config.output().section(&format!("{} {}", kind, bundler.runtime()));
    bundler.validate().await?;
    let artifact = bundler.build().await?;

    for path in &artifact.paths {
        config.success_println(&format!("Created {}", path.display()));
    }
    config.indent(&format!("size: {} bytes", artifact.size));
    config.indent(&format!("sha256: {}", artifact.checksum));
    if !*clean {
        let _ = config
            .output()
            .info(&format!("Build files kept in {}", bundler.temp_root().display()));
    }
    Ok(())
}
