//! The Publish stage: `dotnet publish` plus the optional post-publish script.

use crate::bundler::{
    context::BuildContext,
    error::{ErrorExt, Result},
    interaction::Interaction,
    platform::OsFamily,
    settings::Configuration,
    utils::{
        fs,
        process::{ToolInvocation, ToolRunner, split_args},
    },
};
use regex::Regex;
use std::{path::Path, sync::LazyLock};

/// Scripts that wait for keyboard input stall an unattended build.
static WAITS_FOR_INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*(pause|read)\b").expect("post-publish input regex is valid")
});

/// Publishes the project into the layout's publish directory and runs the
/// post-publish script for the current host, if one is configured.
pub async fn publish(
    ctx: &BuildContext,
    interaction: &Interaction,
    runner: &dyn ToolRunner,
) -> Result<()> {
    let out = &ctx.layout.publish_dir;
    if fs::is_non_empty_dir(out).await? {
        interaction.require(&format!("Delete existing publish output {}?", out.display()))?;
        fs::remove_dir_all(out).await?;
    }
    fs::create_dir_all(out, false).await?;

    let user_args = split_args(&ctx.expand(&ctx.config.dotnet_publish_args));
    let mut invocation = ToolInvocation::new("dotnet")
        .arg("publish")
        .arg(&ctx.project)
        .arg("-r")
        .arg(ctx.runtime.to_string())
        .arg("-c")
        .arg(&ctx.build_config)
        .arg("-o")
        .arg(out)
        .args(user_args)
        .envs(ctx.macros.env());
    if let Some(dir) = ctx.project.parent() {
        invocation = invocation.cwd(dir);
    }
    runner.run(&invocation).await?;

    run_post_publish(ctx, runner).await?;

    let exec = out.join(&ctx.exec_name);
    if ctx.runtime.os != OsFamily::Windows && exec.is_file() {
        fs::set_executable(&exec).await;
    }
    Ok(())
}

fn post_publish_script(config: &Configuration) -> Option<&Path> {
    if OsFamily::current() == Some(OsFamily::Windows) {
        Configuration::optional_path(&config.dotnet_post_publish_on_windows)
    } else {
        Configuration::optional_path(&config.dotnet_post_publish)
    }
}

async fn run_post_publish(ctx: &BuildContext, runner: &dyn ToolRunner) -> Result<()> {
    let Some(source) = post_publish_script(&ctx.config) else {
        return Ok(());
    };

    let text = tokio::fs::read_to_string(source)
        .await
        .fs_context("reading post-publish script", source)?;
    let text = ctx.expand(&text);
    if WAITS_FOR_INPUT.is_match(&text) {
        log::warn!(
            "Post-publish script {} appears to wait for input (pause/read)",
            source.display()
        );
    }

    let scripts = ctx.root.join("scripts");
    let file_name = source.file_name().unwrap_or(source.as_os_str());
    let script = scripts.join(file_name);
    fs::write_file(&script, text).await?;

    let invocation = if OsFamily::current() == Some(OsFamily::Windows) {
        ToolInvocation::new("cmd").arg("/c").arg(&script)
    } else {
        fs::set_executable(&script).await;
        ToolInvocation::new("/bin/sh").arg(&script)
    };
    log::info!("Running post-publish script {}", source.display());
    runner
        .run(&invocation.cwd(&scripts).envs(ctx.macros.env()))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_scripts_that_wait() {
        assert!(WAITS_FOR_INPUT.is_match("echo hi\nPAUSE\n"));
        assert!(WAITS_FOR_INPUT.is_match("  read -p 'continue' x"));
        assert!(!WAITS_FOR_INPUT.is_match("echo reading\nthread=1"));
    }
}
