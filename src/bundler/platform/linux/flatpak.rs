//! Flatpak single-file bundle (.flatpak) builder.
//!
//! The published application and its `share/` tree are staged under
//! `<root>/stage`. A generated `<AppId>.yml` manifest copies them into
//! `/app`; `flatpak-builder` exports the result to a local repository and
//! `flatpak build-bundle` writes the single-file bundle.

use crate::bundler::{
    context::{BuildContext, StageLayout},
    error::{Context, Result},
    resources::templates,
    settings::{Configuration, split_lines},
    utils::{
        fs,
        process::{ToolInvocation, ToolRunner, split_args},
    },
};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::freedesktop;

const MANIFEST_TEMPLATE: &str = r#"app-id: {{app_id}}
runtime: {{runtime}}
runtime-version: '{{runtime_version}}'
sdk: {{sdk}}
command: {{command}}
modules:
  - name: {{module}}
    buildsystem: simple
    sources:
      - type: dir
        path: {{stage}}
    build-commands:
      - mkdir -p /app/bin /app/share
      - cp -a bin/. /app/bin/
      - if [ -d share ]; then cp -a share/. /app/share/; fi
finish-args:
{{#each finish_args}}
  - {{this}}
{{/each}}
"#;

#[derive(Serialize)]
struct ManifestContext<'a> {
    app_id: &'a str,
    runtime: &'a str,
    runtime_version: &'a str,
    sdk: &'a str,
    command: &'a str,
    module: String,
    stage: String,
    finish_args: Vec<String>,
}

/// `stage/bin` inside `root`; the application runs from `/app/bin`.
pub fn layout(root: &Path, _config: &Configuration) -> StageLayout {
    let build_root = root.join("stage");
    StageLayout {
        publish_dir: build_root.join("bin"),
        build_root,
        install_bin: "/app/bin".to_string(),
    }
}

/// Settings that must be present to build a Flatpak.
pub fn check(config: &Configuration) -> Vec<String> {
    [
        ("FlatpakPlatformRuntime", &config.flatpak_platform_runtime),
        ("FlatpakPlatformSdk", &config.flatpak_platform_sdk),
        ("FlatpakPlatformVersion", &config.flatpak_platform_version),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(key, _)| format!("{key} is required to build a Flatpak"))
    .collect()
}

/// Builds the `share/` tree next to `bin/`.
pub async fn stage(ctx: &BuildContext) -> Result<()> {
    let share = ctx.layout.build_root.join("share");
    freedesktop::install_desktop_files(ctx, &share)
        .await
        .context("failed to install desktop files")?;
    freedesktop::install_icons(ctx, &share).await?;
    freedesktop::install_docs(ctx, &share.join("doc").join(&ctx.config.app_id), false).await;
    Ok(())
}

fn manifest_path(ctx: &BuildContext) -> PathBuf {
    ctx.root.join(format!("{}.yml", ctx.config.app_id))
}

/// Renders the flatpak-builder manifest.
pub fn manifest(ctx: &BuildContext) -> Result<String> {
    let conf = &ctx.config;
    let data = ManifestContext {
        app_id: &conf.app_id,
        runtime: conf.flatpak_platform_runtime.trim(),
        runtime_version: conf.flatpak_platform_version.trim(),
        sdk: conf.flatpak_platform_sdk.trim(),
        command: &ctx.exec_name,
        module: super::package_id(conf),
        stage: ctx.layout.build_root.to_string_lossy().into_owned(),
        finish_args: split_lines(&ctx.expand(&conf.flatpak_finish_args)),
    };
    templates::render("flatpak.yml", MANIFEST_TEMPLATE, &data)
}

/// Writes `<AppId>.yml` at the root.
pub async fn write_manifest(ctx: &BuildContext) -> Result<()> {
    let path = manifest_path(ctx);
    fs::write_file(&path, manifest(ctx)?)
        .await
        .context("failed to write flatpak manifest")?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Runs `flatpak-builder`, then `flatpak build-bundle`.
pub async fn invoke(ctx: &BuildContext, runner: &dyn ToolRunner) -> Result<PathBuf> {
    let arch = ctx.runtime.arch.flatpak();
    let repo = ctx.root.join("repo");
    let build_dir = ctx.root.join("build");
    let produced = ctx.staged_output();

    let build = ToolInvocation::new("flatpak-builder")
        .args(split_args(&ctx.expand(&ctx.config.flatpak_builder_args)))
        .arg(format!("--arch={arch}"))
        .arg(format!("--repo={}", repo.display()))
        .arg("--force-clean")
        .arg(&build_dir)
        .arg(manifest_path(ctx))
        .cwd(&ctx.root)
        .envs(ctx.macros.env());
    runner.run(&build).await?;

    let bundle = ToolInvocation::new("flatpak")
        .arg("build-bundle")
        .arg(format!("--arch={arch}"))
        .arg(&repo)
        .arg(&produced)
        .arg(&ctx.config.app_id)
        .cwd(&ctx.root)
        .envs(ctx.macros.env());
    runner.run(&bundle).await?;
    Ok(produced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_platform_settings_are_reported_together() {
        let mut conf = Configuration::default();
        assert!(check(&conf).is_empty());
        conf.flatpak_platform_runtime.clear();
        conf.flatpak_platform_version = "  ".into();
        let problems = check(&conf);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("FlatpakPlatformRuntime"));
    }
}
