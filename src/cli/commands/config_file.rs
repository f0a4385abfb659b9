//! `new` and `upgrade` commands.

use crate::bundler::settings::writer;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{CliError, Result};

/// Execute new command
pub(super) async fn execute_new(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::New { conf, verbose_comments } = &args.command else {
        return Err(CliError::ExecutionFailed {
            command: "new".to_string(),
            reason: "Invalid command type".to_string(),
        }
        .into());
    };

    writer::create_default(conf, *verbose_comments).await?;
    config.success_println(&format!("Created {}", conf.display()));
    config.indent("Edit AppBaseName, AppId and AppVersionRelease before building.");
    Ok(())
}

/// Execute upgrade command
pub(super) async fn execute_upgrade(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Upgrade { conf, verbose_comments } = &args.command else {
        return Err(CliError::ExecutionFailed {
            command: "upgrade".to_string(),
            reason: "Invalid command type".to_string(),
        }
        .into());
    };

    writer::upgrade(conf, *verbose_comments).await?;
    config.success_println(&format!("Upgraded {}", conf.display()));
    config.indent(&format!("Previous contents saved as {}.old", conf.display()));
    Ok(())
}
