//! Freedesktop.org integration shared by the Linux formats.
//!
//! Produces the `usr/` (or Flatpak `share/`) tree:
//!
//! ```text
//! usr/
//!   bin/<StartCommand>                         launcher, package formats only
//!   share/applications/<AppId>.desktop
//!   share/metainfo/<AppId>.metainfo.xml
//!   share/icons/hicolor/<WxH|scalable>/apps/<AppId>.<ext>
//!   share/pixmaps/<AppId>.png                   largest PNG
//!   share/doc/<package>/...                     license and changelog
//! ```

use crate::bundler::{
    context::BuildContext,
    error::{Context, Error, ErrorExt, Result},
    resources::{
        icons::{IconFormat, largest_png},
        templates::{DESKTOP_TEMPLATE, METAINFO_TEMPLATE, to_lf},
    },
    settings::Configuration,
    utils::fs,
};
use flate2::{Compression, write::GzEncoder};
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

/// `<AppId>.desktop`
pub fn desktop_file_name(config: &Configuration) -> String {
    format!("{}.desktop", config.app_id)
}

/// `<AppId>.metainfo.xml`
pub fn metainfo_file_name(config: &Configuration) -> String {
    format!("{}.metainfo.xml", config.app_id)
}

/// Reads a custom template or falls back to the built-in one, then expands
/// macros, XML-escaping them when `xml` is set. Returns `None` when the field
/// is `NONE`.
async fn render(
    ctx: &BuildContext,
    field: &str,
    builtin: &str,
    xml: bool,
) -> Result<Option<String>> {
    if Configuration::is_disabled(field) {
        return Ok(None);
    }
    let template = match Configuration::optional_path(field) {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .fs_context("reading template", path)?,
        None => builtin.to_string(),
    };
    let expanded = if xml {
        ctx.macros.expand_xml(&template)
    } else {
        ctx.expand(&template)
    };
    Ok(Some(to_lf(&expanded)))
}

/// The expanded desktop entry, or `None` when disabled.
pub async fn desktop_entry(ctx: &BuildContext) -> Result<Option<String>> {
    render(ctx, &ctx.config.desktop_file, DESKTOP_TEMPLATE, false).await
}

/// The expanded AppStream metainfo, or `None` when disabled.
pub async fn metainfo(ctx: &BuildContext) -> Result<Option<String>> {
    render(ctx, &ctx.config.meta_file, METAINFO_TEMPLATE, true).await
}

/// Writes the desktop entry and metainfo under `share_dir`.
pub async fn install_desktop_files(ctx: &BuildContext, share_dir: &Path) -> Result<()> {
    if let Some(entry) = desktop_entry(ctx).await? {
        let dest = share_dir
            .join("applications")
            .join(desktop_file_name(&ctx.config));
        fs::write_file(&dest, entry).await?;
        log::debug!("Wrote {}", dest.display());
    }
    if let Some(meta) = metainfo(ctx).await? {
        let dest = share_dir.join("metainfo").join(metainfo_file_name(&ctx.config));
        fs::write_file(&dest, meta).await?;
        log::debug!("Wrote {}", dest.display());
    }
    Ok(())
}

/// Copies icons into the hicolor theme under `share_dir`.
///
/// SVG goes to `scalable`, PNG to its `WxH` bucket; the largest PNG is also
/// copied to `pixmaps`. ICO and ICNS files are skipped.
pub async fn install_icons(ctx: &BuildContext, share_dir: &Path) -> Result<Vec<PathBuf>> {
    let app_id = &ctx.config.app_id;
    let mut installed = Vec::new();

    for icon in &ctx.config.icons {
        let Some(bucket) = icon.bucket() else {
            continue;
        };
        icon.check_dimensions();
        let dest = share_dir
            .join("icons/hicolor")
            .join(&bucket)
            .join("apps")
            .join(format!("{app_id}.{}", icon.format.extension()));
        fs::copy_file(&icon.path, &dest).await?;
        log::debug!("Installed {bucket} icon to {}", dest.display());
        installed.push(dest);
    }

    if let Some(png) = largest_png(&ctx.config.icons) {
        let dest = share_dir.join("pixmaps").join(format!("{app_id}.png"));
        fs::copy_file(&png.path, &dest).await?;
        installed.push(dest);
    }

    Ok(installed)
}

/// Writes `usr/bin/<StartCommand>` that execs the installed binary.
pub async fn install_launcher(ctx: &BuildContext, usr_dir: &Path) -> Result<Option<PathBuf>> {
    let Some(command) = ctx.launcher_command() else {
        return Ok(None);
    };
    let dest = usr_dir.join("bin").join(command);
    let script = ctx.expand("#!/bin/sh\nexec \"${INSTALL_EXEC}\" \"$@\"\n");
    fs::write_file(&dest, script).await?;
    fs::set_executable(&dest).await;
    log::debug!("Wrote launcher {}", dest.display());
    Ok(Some(dest))
}

/// Copies the license and changelog into `doc_dir`.
///
/// With `gzip_changelog` the changelog is written as `changelog.gz`.
/// Copy failures are logged and skipped.
pub async fn install_docs(ctx: &BuildContext, doc_dir: &Path, gzip_changelog: bool) {
    if let Some(license) = Configuration::optional_path(&ctx.config.app_license_file) {
        let name = license.file_name().unwrap_or(license.as_os_str());
        if let Err(e) = fs::copy_file(license, &doc_dir.join(name)).await {
            log::warn!("Could not copy license file: {e}");
        }
    }

    let Some(changelog) = Configuration::optional_path(&ctx.config.app_change_file) else {
        return;
    };
    let result = if gzip_changelog {
        gzip_file(changelog, &doc_dir.join("changelog.gz")).await
    } else {
        let name = changelog.file_name().unwrap_or(changelog.as_os_str());
        fs::copy_file(changelog, &doc_dir.join(name)).await
    };
    if let Err(e) = result {
        log::warn!("Could not copy change file: {e}");
    }
}

async fn gzip_file(src: &Path, dest: &Path) -> Result<()> {
    let src = src.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut input = std::fs::File::open(&src).fs_context("opening change file", &src)?;
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).fs_context("creating doc directory", parent)?;
        }
        let output = std::fs::File::create(&dest).fs_context("creating changelog.gz", &dest)?;
        let mut encoder = GzEncoder::new(output, Compression::new(9));
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.flush()?;
        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("changelog compression task failed: {e}")))?
}

/// Builds the complete `usr/` tree for the package formats.
pub async fn stage_usr(ctx: &BuildContext, usr_dir: &Path, gzip_changelog: bool) -> Result<()> {
    let share = usr_dir.join("share");
    if ctx.config.desktop_integrate {
        install_desktop_files(ctx, &share)
            .await
            .context("failed to install desktop files")?;
        install_icons(ctx, &share)
            .await
            .context("failed to install icons")?;
    }
    install_launcher(ctx, usr_dir).await?;
    let doc_dir = share.join("doc").join(super::package_id(&ctx.config));
    install_docs(ctx, &doc_dir, gzip_changelog).await;
    Ok(())
}

/// Relative paths of every regular file under `root`, sorted.
pub fn staged_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() || entry.file_type().is_symlink() {
            files.push(entry.path().strip_prefix(root)?.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Whether any icon would be installed into the hicolor theme.
pub fn has_theme_icons(config: &Configuration) -> bool {
    config
        .icons
        .iter()
        .any(|i| matches!(i.format, IconFormat::Png | IconFormat::Svg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::platform::{Arch, OsFamily, PackageType, Runtime};

    #[tokio::test]
    async fn metainfo_escapes_values_and_desktop_entry_does_not() {
        let mut conf = Configuration::default();
        conf.app_friendly_name = "Tom & Jerry".into();
        conf.app_short_summary = "Cat <and> mouse".into();
        let runtime = Runtime {
            os: OsFamily::Linux,
            arch: Arch::X64,
        };
        let ctx = BuildContext::for_test(conf, PackageType::Deb, runtime, Path::new("/tmp/fd")).await;

        let meta = metainfo(&ctx).await.unwrap().unwrap();
        assert!(meta.contains("<name>Tom &amp; Jerry</name>"));
        assert!(meta.contains("<summary>Cat &lt;and&gt; mouse</summary>"));
        assert!(!meta.contains("${"));

        let entry = desktop_entry(&ctx).await.unwrap().unwrap();
        assert!(entry.contains("Name=Tom & Jerry\n"));
    }
}
