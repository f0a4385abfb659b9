//! Arch Linux package (.pkg.tar.zst) builder.
//!
//! `makepkg` runs against a generated `PKGBUILD` whose `package()` function
//! copies the prebuilt `stage/` tree into `$pkgdir`.

use crate::bundler::{
    context::{BuildContext, StageLayout},
    error::{Context, Error, Result},
    resources::templates,
    settings::{Configuration, split_list},
    utils::{
        fs,
        process::{ToolInvocation, ToolRunner},
    },
};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{freedesktop, opt_dir, package_id};

const PKGBUILD_TEMPLATE: &str = r#"# Generated by netloy
pkgname={{name}}
pkgver={{version}}
pkgrel={{release}}
pkgdesc="{{summary}}"
arch=('{{arch}}')
url="{{url}}"
license=('{{license}}')
depends=({{#each depends}}'{{this}}' {{/each}})
options=('!strip' '!debug')

package() {
  cp -a "{{stage}}/." "$pkgdir/"
}
"#;

#[derive(Serialize)]
struct PkgbuildContext<'a> {
    name: String,
    version: String,
    release: String,
    summary: String,
    arch: &'a str,
    url: &'a str,
    license: &'a str,
    depends: Vec<String>,
    stage: String,
}

/// `stage/opt/<AppId>` inside `root`.
pub fn layout(root: &Path, config: &Configuration) -> StageLayout {
    let build_root = root.join("stage");
    let install_bin = opt_dir(config);
    StageLayout {
        publish_dir: build_root.join(install_bin.trim_start_matches('/')),
        build_root,
        install_bin,
    }
}

/// Builds the `usr/` tree.
pub async fn stage(ctx: &BuildContext) -> Result<()> {
    freedesktop::stage_usr(ctx, &ctx.layout.build_root.join("usr"), false).await
}

/// Renders the PKGBUILD.
///
/// `pkgver` may not contain `-`, so hyphens become `_`.
pub fn pkgbuild(ctx: &BuildContext) -> Result<String> {
    let conf = &ctx.config;
    let data = PkgbuildContext {
        name: package_id(conf),
        version: ctx.app_version.replace('-', "_"),
        release: ctx.package_release.clone(),
        summary: conf.app_short_summary.trim().replace('"', "'"),
        arch: ctx.runtime.arch.pacman(),
        url: conf.publisher_link_url.trim(),
        license: conf.app_license_id.trim(),
        depends: split_list(&conf.pacman_depends),
        stage: ctx.layout.build_root.to_string_lossy().into_owned(),
    };
    templates::render("PKGBUILD", PKGBUILD_TEMPLATE, &data)
}

/// Writes `PKGBUILD` at the root.
pub async fn write_manifest(ctx: &BuildContext) -> Result<()> {
    let path = ctx.root.join("PKGBUILD");
    fs::write_file(&path, pkgbuild(ctx)?)
        .await
        .context("failed to write PKGBUILD")?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Runs `makepkg` and returns the package it wrote.
pub async fn invoke(ctx: &BuildContext, runner: &dyn ToolRunner) -> Result<PathBuf> {
    let pkg_dest = ctx.root.join("pkg");
    fs::create_dir_all(&pkg_dest, true).await?;

    let invocation = ToolInvocation::new("makepkg")
        .arg("--nodeps")
        .arg("--force")
        .cwd(&ctx.root)
        .envs(ctx.macros.env())
        .env("PKGDEST", pkg_dest.to_string_lossy())
        .env("PKGEXT", ".pkg.tar.zst");
    runner.run(&invocation).await?;

    let pattern = pkg_dest.join("*.pkg.tar.zst");
    glob::glob(&pattern.to_string_lossy())?
        .filter_map(|e| e.ok())
        .next()
        .ok_or_else(|| Error::NotFound {
            what: "makepkg output".into(),
            path: pkg_dest,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::platform::{Arch, OsFamily, PackageType, Runtime};

    #[tokio::test]
    async fn pkgbuild_copies_the_stage_tree() {
        let mut conf = Configuration::default();
        conf.pacman_depends = "dotnet-runtime, icu".into();
        conf.app_short_summary = "Says \"hi\"".into();
        let runtime = Runtime {
            os: OsFamily::Linux,
            arch: Arch::Arm64,
        };
        let ctx =
            BuildContext::for_test(conf, PackageType::Pacman, runtime, Path::new("/tmp/pac")).await;

        let text = pkgbuild(&ctx).unwrap();
        assert!(text.contains("pkgname=helloworld\n"));
        assert!(text.contains("pkgver=1.0.0\npkgrel=1\n"));
        assert!(text.contains("pkgdesc=\"Says 'hi'\"\n"));
        assert!(text.contains("arch=('aarch64')\n"));
        assert!(text.contains("depends=('dotnet-runtime' 'icu' )\n"));
        assert!(text.contains("cp -a \"/tmp/pac/stage/.\" \"$pkgdir/\""));
    }
}
