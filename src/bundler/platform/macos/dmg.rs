//! macOS disk image (.dmg) creation.
//!
//! The volume folder `<root>/dmg` holds the application bundle and an
//! `Applications` symlink for drag-and-drop installs. `hdiutil create`
//! turns the folder into a compressed read-only image.

use crate::bundler::{
    context::{BuildContext, StageLayout},
    error::{ErrorExt, Result},
    settings::Configuration,
    utils::process::{ToolInvocation, ToolRunner},
};
use std::path::{Path, PathBuf};

use super::{app, bundle_name, install_bin};

/// `dmg/<AppFriendlyName>.app` inside `root`.
pub fn layout(root: &Path, config: &Configuration) -> StageLayout {
    let build_root = root.join("dmg");
    StageLayout {
        publish_dir: build_root.join(bundle_name(config)).join("Contents/MacOS"),
        build_root,
        install_bin: install_bin(config),
    }
}

fn bundle_dir(ctx: &BuildContext) -> PathBuf {
    ctx.layout.build_root.join(bundle_name(&ctx.config))
}

/// Stages the bundle and the `Applications` link.
pub async fn stage(ctx: &BuildContext) -> Result<()> {
    app::stage_bundle(ctx, &bundle_dir(ctx)).await?;

    let link = ctx.layout.build_root.join("Applications");
    #[cfg(unix)]
    {
        if !link.exists() {
            std::os::unix::fs::symlink("/Applications", &link)
                .fs_context("creating Applications link", &link)?;
        }
    }
    #[cfg(not(unix))]
    log::warn!("Skipping {} on a non-Unix host", link.display());
    Ok(())
}

/// Writes `Info.plist` inside the staged bundle.
pub async fn write_manifest(ctx: &BuildContext) -> Result<()> {
    app::write_bundle_manifest(ctx, &bundle_dir(ctx)).await
}

/// Runs `hdiutil create`.
pub async fn invoke(ctx: &BuildContext, runner: &dyn ToolRunner) -> Result<PathBuf> {
    let produced = ctx.staged_output();
    let invocation = ToolInvocation::new("hdiutil")
        .arg("create")
        .arg("-volname")
        .arg(ctx.config.app_friendly_name.trim())
        .arg("-srcfolder")
        .arg(&ctx.layout.build_root)
        .args(["-ov", "-format", "UDZO"])
        .arg(&produced)
        .cwd(&ctx.root)
        .envs(ctx.macros.env());
    runner.run(&invocation).await?;
    Ok(produced)
}
