//! WiX Toolset (.msi) builder.
//!
//! Generates a WiX v4 `product.wxs` that harvests the publish directory with
//! a `Files` element, and builds it with `wix build`.

use crate::bundler::{
    context::{BuildContext, StageLayout},
    error::{Context, Result},
    resources::{appstream::escape, templates},
    settings::Configuration,
    utils::{
        fs,
        process::{ToolInvocation, ToolRunner},
    },
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{numeric_version, publish_dir, setup_icon, write_utf8_bom};

const WXS_TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- Generated by netloy -->
<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs">
  <Package Name="{{friendly_name}}" Manufacturer="{{publisher}}" Version="{{version}}" UpgradeCode="{{upgrade_code}}" Scope="{{scope}}">
    <MajorUpgrade DowngradeErrorMessage="A newer version of {{friendly_name}} is already installed." />
    <MediaTemplate EmbedCab="yes" />
{{#if icon}}
    <Icon Id="AppIcon" SourceFile="{{icon}}" />
    <Property Id="ARPPRODUCTICON" Value="AppIcon" />
{{/if}}
{{#if url}}
    <Property Id="ARPURLINFOABOUT" Value="{{url}}" />
{{/if}}
    <StandardDirectory Id="{{program_files}}">
      <Directory Id="INSTALLFOLDER" Name="{{install_name}}" />
    </StandardDirectory>
    <StandardDirectory Id="ProgramMenuFolder">
      <Directory Id="AppMenuFolder" Name="{{group}}" />
    </StandardDirectory>
    <ComponentGroup Id="AppFiles" Directory="INSTALLFOLDER">
      <Files Include="{{publish_glob}}" />
    </ComponentGroup>
    <Component Id="MenuShortcut" Directory="AppMenuFolder">
      <Shortcut Id="AppShortcut" Name="{{friendly_name}}" Target="[INSTALLFOLDER]{{exec}}" WorkingDirectory="INSTALLFOLDER" />
      <RemoveFolder Id="RemoveAppMenuFolder" On="uninstall" />
      <RegistryValue Root="HKCU" Key="{{registry_key}}" Name="installed" Type="integer" Value="1" KeyPath="yes" />
    </Component>
    <Feature Id="Main">
      <ComponentGroupRef Id="AppFiles" />
      <ComponentRef Id="MenuShortcut" />
    </Feature>
  </Package>
</Wix>
"#;

#[derive(Serialize)]
struct WxsContext {
    friendly_name: String,
    publisher: String,
    version: String,
    upgrade_code: String,
    scope: &'static str,
    icon: String,
    url: String,
    program_files: &'static str,
    install_name: String,
    group: String,
    publish_glob: String,
    exec: String,
    registry_key: String,
}

/// `<root>/publish`; the package installs into `[INSTALLFOLDER]`.
pub fn layout(root: &Path, _config: &Configuration) -> StageLayout {
    StageLayout {
        build_root: root.to_path_buf(),
        publish_dir: publish_dir(root),
        install_bin: "[INSTALLFOLDER]".to_string(),
    }
}

/// Stable upgrade code: `MsiUpgradeCode`, or a v5 UUID derived from `AppId`.
pub fn upgrade_code(config: &Configuration) -> String {
    let configured = config.msi_upgrade_code.trim().trim_matches(['{', '}']);
    match Uuid::parse_str(configured) {
        Ok(code) => code.hyphenated().to_string().to_uppercase(),
        Err(_) => Uuid::new_v5(&Uuid::NAMESPACE_DNS, config.app_id.as_bytes())
            .hyphenated()
            .to_string()
            .to_uppercase(),
    }
}

/// Nothing to stage beyond the publish output.
pub async fn stage(ctx: &BuildContext) -> Result<()> {
    if setup_icon(&ctx.config).is_none() {
        log::warn!("No .ico icon configured; the package will use the default icon");
    }
    Ok(())
}

/// Renders `product.wxs`.
pub fn source(ctx: &BuildContext) -> Result<String> {
    let conf = &ctx.config;
    let data = WxsContext {
        friendly_name: escape(conf.app_friendly_name.trim()),
        publisher: escape(conf.publisher_name.trim()),
        version: numeric_version(&ctx.app_version),
        upgrade_code: upgrade_code(conf),
        scope: if conf.setup_admin_install { "perMachine" } else { "perUser" },
        icon: setup_icon(conf)
            .map(|p| escape(&p.display().to_string()))
            .unwrap_or_default(),
        url: escape(conf.publisher_link_url.trim()),
        program_files: if conf.setup_admin_install {
            "ProgramFiles6432Folder"
        } else {
            "LocalAppDataFolder"
        },
        install_name: escape(conf.app_friendly_name.trim()),
        group: escape(conf.setup_group_name().trim()),
        publish_glob: escape(&format!("{}\\**", ctx.layout.publish_dir.display())),
        exec: escape(&ctx.exec_name),
        registry_key: escape(&format!(
            "Software\\{}\\{}",
            conf.publisher_name.trim(),
            conf.app_base_name
        )),
    };
    templates::render("product.wxs", WXS_TEMPLATE, &data)
}

/// Writes `product.wxs`.
pub async fn write_manifest(ctx: &BuildContext) -> Result<()> {
    let path = ctx.root.join("product.wxs");
    write_utf8_bom(&path, &source(ctx)?)
        .await
        .context("failed to write product.wxs")?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Runs `wix build`.
pub async fn invoke(ctx: &BuildContext, runner: &dyn ToolRunner) -> Result<PathBuf> {
    let produced = ctx.staged_output();
    let out_dir = ctx.root.join("out");
    fs::create_dir_all(&out_dir, true).await?;

    let invocation = ToolInvocation::new("wix")
        .arg("build")
        .arg("-arch")
        .arg(ctx.runtime.arch.windows())
        .arg("-intermediatefolder")
        .arg(&out_dir)
        .arg("-o")
        .arg(&produced)
        .arg(ctx.root.join("product.wxs"))
        .cwd(&ctx.root)
        .envs(ctx.macros.env());
    runner.run(&invocation).await?;
    Ok(produced)
}
