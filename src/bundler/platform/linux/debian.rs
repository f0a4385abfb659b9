//! Debian package (.deb) builder.
//!
//! Staging tree under `<root>/build`:
//!
//! ```text
//! build/
//!   DEBIAN/control
//!   opt/<AppId>/...          published application
//!   usr/...                  desktop integration, launcher, docs
//! ```
//!
//! The package is produced by `dpkg-deb --root-owner-group --build`.

use crate::bundler::{
    context::{BuildContext, StageLayout},
    error::{Context, Result},
    settings::{Configuration, split_list},
    utils::{
        fs,
        process::{ToolInvocation, ToolRunner},
    },
};
use std::{fmt::Write as _, path::Path, path::PathBuf};

use super::{freedesktop, opt_dir, package_id};

/// `build/opt/<AppId>` inside `root`.
pub fn layout(root: &Path, config: &Configuration) -> StageLayout {
    let build_root = root.join("build");
    let install_bin = opt_dir(config);
    StageLayout {
        publish_dir: build_root.join(install_bin.trim_start_matches('/')),
        build_root,
        install_bin,
    }
}

/// Builds the `usr/` tree.
pub async fn stage(ctx: &BuildContext) -> Result<()> {
    freedesktop::stage_usr(ctx, &ctx.layout.build_root.join("usr"), true).await
}

/// Writes `DEBIAN/control`.
pub async fn write_manifest(ctx: &BuildContext) -> Result<()> {
    let installed_kb = fs::total_size(&ctx.layout.build_root)? / 1024;
    let control = control_file(ctx, installed_kb);
    let path = ctx.layout.build_root.join("DEBIAN/control");
    fs::write_file(&path, control)
        .await
        .context("failed to write control file")?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Renders the control file.
pub fn control_file(ctx: &BuildContext, installed_kb: u64) -> String {
    let conf = &ctx.config;
    let mut out = String::new();
    let _ = writeln!(out, "Package: {}", package_id(conf));
    let _ = writeln!(out, "Version: {}-{}", ctx.app_version, ctx.package_release);
    let section = conf.debian_section.trim();
    if !section.is_empty() {
        let _ = writeln!(out, "Section: {section}");
    }
    let _ = writeln!(out, "Priority: optional");
    let _ = writeln!(out, "Architecture: {}", ctx.runtime.arch.debian());
    let _ = writeln!(out, "Installed-Size: {installed_kb}");

    let recommends = split_list(&conf.debian_recommends);
    if !recommends.is_empty() {
        let _ = writeln!(out, "Recommends: {}", recommends.join(", "));
    }

    let email = conf.publisher_email.trim();
    if email.is_empty() {
        let _ = writeln!(out, "Maintainer: {}", conf.publisher_name);
    } else {
        let _ = writeln!(out, "Maintainer: {} <{email}>", conf.publisher_name);
    }
    let url = conf.publisher_link_url.trim();
    if !url.is_empty() {
        let _ = writeln!(out, "Homepage: {url}");
    }

    let _ = writeln!(out, "Description: {}", conf.app_short_summary.trim());
    for line in conf.app_description.lines() {
        if line.trim().is_empty() {
            let _ = writeln!(out, " .");
        } else {
            let _ = writeln!(out, " {}", line.trim());
        }
    }
    out
}

/// Runs `dpkg-deb` and returns the package it wrote.
pub async fn invoke(ctx: &BuildContext, runner: &dyn ToolRunner) -> Result<PathBuf> {
    let produced = ctx.staged_output();

    let invocation = ToolInvocation::new("dpkg-deb")
        .arg("--root-owner-group")
        .arg("--build")
        .arg(&ctx.layout.build_root)
        .arg(&produced)
        .cwd(&ctx.root)
        .envs(ctx.macros.env());
    runner.run(&invocation).await?;
    Ok(produced)
}
