//! AppImage builder - portable Linux applications.
//!
//! ```text
//! <AppBaseName>.AppDir/
//!   AppRun                      execs usr/bin/<AppBaseName>
//!   <AppId>.desktop             copy of the desktop entry
//!   <AppId>.png | <AppId>.svg   icon referenced by the entry
//!   .DirIcon
//!   usr/bin/...                 published application
//!   usr/share/...               desktop integration
//! ```
//!
//! The image itself is produced by `appimagetool`.

use crate::bundler::{
    context::{BuildContext, StageLayout},
    error::{Error, Result},
    resources::icons::{IconFormat, first_of, largest_png},
    settings::Configuration,
    utils::{
        fs,
        process::{ToolInvocation, ToolRunner, split_args},
    },
};
use std::path::{Path, PathBuf};

use super::freedesktop;

fn app_dir(root: &Path, config: &Configuration) -> PathBuf {
    root.join(format!("{}.AppDir", config.app_base_name))
}

/// `<AppBaseName>.AppDir/usr/bin` inside `root`.
pub fn layout(root: &Path, config: &Configuration) -> StageLayout {
    let build_root = app_dir(root, config);
    StageLayout {
        publish_dir: build_root.join("usr/bin"),
        build_root,
        install_bin: "usr/bin".to_string(),
    }
}

/// Fills the AppDir around the published binaries.
pub async fn stage(ctx: &BuildContext) -> Result<()> {
    let app_dir = &ctx.layout.build_root;
    let share = app_dir.join("usr/share");

    if !freedesktop::has_theme_icons(&ctx.config) {
        log::warn!("No PNG or SVG icon configured; appimagetool requires one");
    }
    freedesktop::install_icons(ctx, &share).await?;
    freedesktop::install_docs(ctx, &share.join("doc").join(&ctx.config.app_id), false).await;

    let icon = largest_png(&ctx.config.icons).or_else(|| first_of(&ctx.config.icons, IconFormat::Svg));
    if let Some(icon) = icon {
        let name = format!("{}.{}", ctx.config.app_id, icon.format.extension());
        fs::copy_file(&icon.path, &app_dir.join(name)).await?;
        fs::copy_file(&icon.path, &app_dir.join(".DirIcon")).await?;
    }

    let app_run = app_dir.join("AppRun");
    let script = format!(
        "#!/bin/sh\nHERE=\"$(dirname \"$(readlink -f \"$0\")\")\"\nexec \"$HERE/usr/bin/{}\" \"$@\"\n",
        ctx.exec_name
    );
    fs::write_file(&app_run, script).await?;
    fs::set_executable(&app_run).await;
    Ok(())
}

/// Writes the desktop entry at the AppDir root and the metainfo under
/// `usr/share`. appimagetool needs the entry, so `NONE` is an error here.
pub async fn write_manifest(ctx: &BuildContext) -> Result<()> {
    let app_dir = &ctx.layout.build_root;
    let entry = freedesktop::desktop_entry(ctx).await?.ok_or_else(|| {
        Error::GenericError("AppImage requires a desktop entry; DesktopFile cannot be NONE".into())
    })?;
    let name = freedesktop::desktop_file_name(&ctx.config);
    fs::write_file(&app_dir.join(&name), &entry).await?;
    fs::write_file(&app_dir.join("usr/share/applications").join(&name), &entry).await?;

    if let Some(meta) = freedesktop::metainfo(ctx).await? {
        let path = app_dir
            .join("usr/share/metainfo")
            .join(freedesktop::metainfo_file_name(&ctx.config));
        fs::write_file(&path, meta).await?;
    }
    Ok(())
}

/// Runs `appimagetool` and returns the image it wrote.
pub async fn invoke(ctx: &BuildContext, runner: &dyn ToolRunner) -> Result<PathBuf> {
    let produced = ctx.staged_output();
    let invocation = ToolInvocation::new("appimagetool")
        .args(split_args(&ctx.expand(&ctx.config.app_image_args)))
        .arg(&ctx.layout.build_root)
        .arg(&produced)
        .cwd(&ctx.root)
        .envs(ctx.macros.env())
        .env("ARCH", ctx.runtime.arch.appimage());
    runner.run(&invocation).await?;
    Ok(produced)
}
