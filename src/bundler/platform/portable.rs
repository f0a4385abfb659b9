//! Portable archive builder.
//!
//! The published application is placed in `<root>/<PackageName>` and that
//! folder is archived as a whole: `.zip` for Windows runtimes, `.tar.gz`
//! otherwise. On Windows hosts the bundled `tar` (bsdtar) writes the zip.

use crate::bundler::{
    context::{BuildContext, StageLayout},
    error::Result,
    platform::{OsFamily, Runtime},
    settings::Configuration,
    utils::{
        fs,
        process::{ToolInvocation, ToolRunner},
    },
};
use std::path::{Path, PathBuf};

/// `<root>/<PackageName>`; the executable is relative to the archive folder.
pub fn layout(root: &Path, config: &Configuration) -> StageLayout {
    let name = config.package_name().trim().to_string();
    StageLayout {
        build_root: root.to_path_buf(),
        publish_dir: root.join(&name),
        install_bin: name,
    }
}

/// Archiver used for `runtime` on the current host.
pub fn tools(runtime: Runtime) -> &'static [&'static str] {
    tools_for_host(runtime, OsFamily::current())
}

fn tools_for_host(runtime: Runtime, host: Option<OsFamily>) -> &'static [&'static str] {
    match (runtime.os, host) {
        (OsFamily::Windows, Some(OsFamily::Windows)) => &["tar"],
        (OsFamily::Windows, _) => &["zip"],
        _ => &["tar"],
    }
}

/// Copies the license file next to the application.
pub async fn stage(ctx: &BuildContext) -> Result<()> {
    if let Some(license) = Configuration::optional_path(&ctx.config.app_license_file) {
        let name = license.file_name().unwrap_or(license.as_os_str());
        if let Err(e) = fs::copy_file(license, &ctx.layout.publish_dir.join(name)).await {
            log::warn!("Could not copy license file: {e}");
        }
    }
    Ok(())
}

fn archive_command(ctx: &BuildContext, produced: &Path) -> ToolInvocation {
    let name = ctx.config.package_name().trim();
    match tools(ctx.runtime).first().copied() {
        Some("zip") => ToolInvocation::new("zip")
            .args(["-r", "-q"])
            .arg(produced)
            .arg(name),
        _ if ctx.runtime.os == OsFamily::Windows => ToolInvocation::new("tar")
            .args(["-a", "-c", "-f"])
            .arg(produced)
            .arg(name),
        _ => ToolInvocation::new("tar")
            .arg("-czf")
            .arg(produced)
            .arg("-C")
            .arg(&ctx.root)
            .arg(name),
    }
}

/// Archives the application folder.
pub async fn invoke(ctx: &BuildContext, runner: &dyn ToolRunner) -> Result<PathBuf> {
    let produced = ctx.staged_output();
    let invocation = archive_command(ctx, &produced)
        .cwd(&ctx.root)
        .envs(ctx.macros.env());
    runner.run(&invocation).await?;
    Ok(produced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::platform::Arch;

    #[test]
    fn windows_archives_need_zip_off_windows() {
        let win = Runtime {
            os: OsFamily::Windows,
            arch: Arch::X64,
        };
        let linux = Runtime {
            os: OsFamily::Linux,
            arch: Arch::X64,
        };
        assert_eq!(tools_for_host(win, Some(OsFamily::Linux)), &["zip"]);
        assert_eq!(tools_for_host(win, Some(OsFamily::Windows)), &["tar"]);
        assert_eq!(tools_for_host(linux, Some(OsFamily::MacOs)), &["tar"]);
    }

    #[test]
    fn layout_uses_package_name() {
        let mut conf = Configuration::default();
        conf.package_name = "hello-world".into();
        let layout = layout(Path::new("/tmp/x"), &conf);
        assert_eq!(layout.publish_dir, Path::new("/tmp/x/hello-world"));
        assert_eq!(layout.install_bin, "hello-world");
    }
}
