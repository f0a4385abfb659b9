//! macOS application bundle (.app) creation.
//!
//! The finished bundle is archived with `ditto -c -k --keepParent` so it can
//! be moved as a single `.app.zip` file.

use crate::bundler::{
    context::{BuildContext, StageLayout},
    error::{ErrorExt, Result},
    macros::MacroId,
    resources::icons::{IconFormat, first_of},
    settings::Configuration,
    utils::{
        fs,
        process::{ToolInvocation, ToolRunner},
    },
};
use plist::{Dictionary, Value};
use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use super::{bundle_name, install_bin};

/// `<AppFriendlyName>.app` directly inside `root`.
pub fn layout(root: &Path, config: &Configuration) -> StageLayout {
    let build_root = root.join(bundle_name(config));
    StageLayout {
        publish_dir: build_root.join("Contents/MacOS"),
        build_root,
        install_bin: install_bin(config),
    }
}

fn icon_file_name(config: &Configuration) -> String {
    format!("{}.icns", config.app_base_name)
}

/// Copies the ICNS icon into `Contents/Resources` of `bundle`.
pub async fn stage_bundle(ctx: &BuildContext, bundle: &Path) -> Result<()> {
    let resources = bundle.join("Contents/Resources");
    fs::create_dir_all(&resources, false).await?;

    match first_of(&ctx.config.icons, IconFormat::Icns) {
        Some(icon) => {
            fs::copy_file(&icon.path, &resources.join(icon_file_name(&ctx.config))).await?;
        }
        None => log::warn!("No .icns icon configured; the bundle will use the default icon"),
    }

    if let Some(license) = Configuration::optional_path(&ctx.config.app_license_file) {
        let name = license.file_name().unwrap_or(license.as_os_str());
        if let Err(e) = fs::copy_file(license, &resources.join(name)).await {
            log::warn!("Could not copy license file: {e}");
        }
    }
    Ok(())
}

/// Stages the bundle.
pub async fn stage(ctx: &BuildContext) -> Result<()> {
    stage_bundle(ctx, &ctx.layout.build_root).await
}

/// Generates the Info.plist dictionary, merging `MacOsInfoPlist` over it.
pub async fn info_plist(ctx: &BuildContext) -> Result<Dictionary> {
    let conf = &ctx.config;
    let mut dict = Dictionary::new();

    dict.insert("CFBundleDevelopmentRegion".into(), "en".into());
    dict.insert("CFBundleName".into(), conf.app_friendly_name.clone().into());
    dict.insert("CFBundleDisplayName".into(), conf.app_friendly_name.clone().into());
    dict.insert("CFBundleExecutable".into(), ctx.exec_name.clone().into());
    dict.insert("CFBundleIdentifier".into(), conf.app_id.clone().into());
    dict.insert("CFBundlePackageType".into(), "APPL".into());
    dict.insert("CFBundleShortVersionString".into(), ctx.app_version.clone().into());
    dict.insert("CFBundleVersion".into(), ctx.app_version.clone().into());
    dict.insert("CFBundleInfoDictionaryVersion".into(), "6.0".into());
    if first_of(&conf.icons, IconFormat::Icns).is_some() {
        dict.insert("CFBundleIconFile".into(), icon_file_name(conf).into());
    }
    dict.insert(
        "LSApplicationCategoryType".into(),
        ctx.macros.get(MacroId::PrimeCategory).into(),
    );
    dict.insert("LSMinimumSystemVersion".into(), conf.mac_os_min_version.clone().into());
    dict.insert(
        "LSArchitecturePriority".into(),
        Value::Array(vec![ctx.runtime.arch.macos().into()]),
    );
    dict.insert("NSHighResolutionCapable".into(), true.into());
    let copyright = ctx.macros.get(MacroId::PublisherCopyright);
    if !copyright.is_empty() {
        dict.insert("NSHumanReadableCopyright".into(), copyright.into());
    }

    if let Some(path) = Configuration::optional_path(&conf.mac_os_info_plist) {
        let text = tokio::fs::read_to_string(path)
            .await
            .fs_context("reading MacOsInfoPlist", path)?;
        let custom = Value::from_reader(Cursor::new(ctx.expand(&text).into_bytes()))?;
        let Value::Dictionary(custom) = custom else {
            crate::bail!("{} must contain a dictionary", path.display());
        };
        for (key, value) in custom {
            dict.insert(key, value);
        }
    }
    Ok(dict)
}

/// Writes `Contents/Info.plist` of `bundle` and the entitlements next to it.
pub async fn write_bundle_manifest(ctx: &BuildContext, bundle: &Path) -> Result<()> {
    let dict = info_plist(ctx).await?;
    let plist_path = bundle.join("Contents/Info.plist");
    let mut xml = Vec::new();
    Value::Dictionary(dict).to_writer_xml(&mut xml)?;
    fs::write_file(&plist_path, xml).await?;
    log::debug!("Wrote {}", plist_path.display());

    if let Some(path) = Configuration::optional_path(&ctx.config.mac_os_entitlements) {
        let text = tokio::fs::read_to_string(path)
            .await
            .fs_context("reading MacOsEntitlements", path)?;
        let dest = ctx
            .root
            .join(format!("{}.entitlements", ctx.config.app_base_name));
        fs::write_file(&dest, ctx.expand(&text)).await?;
    }
    Ok(())
}

/// Writes `Info.plist`.
pub async fn write_manifest(ctx: &BuildContext) -> Result<()> {
    write_bundle_manifest(ctx, &ctx.layout.build_root).await
}

/// Zips the bundle with `ditto`.
pub async fn invoke(ctx: &BuildContext, runner: &dyn ToolRunner) -> Result<PathBuf> {
    let produced = ctx.staged_output();
    let invocation = ToolInvocation::new("ditto")
        .args(["-c", "-k", "--keepParent"])
        .arg(&ctx.layout.build_root)
        .arg(&produced)
        .cwd(&ctx.root)
        .envs(ctx.macros.env());
    runner.run(&invocation).await?;
    Ok(produced)
}
