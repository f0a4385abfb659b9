//! RPM package (.rpm) builder for Red Hat-based distributions.
//!
//! The tree under `<root>/buildroot` is handed to `rpmbuild -bb` as a
//! prebuilt build root; the spec file lists every staged file and has no
//! build or install scriptlets of its own.

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

const SPEC_TEMPLATE: &str = r#"Name: {{name}}
Version: {{version}}
Release: {{release}}
BuildArch: {{arch}}
Summary: {{summary}}
License: {{license}}
Vendor: {{vendor}}
{{#if url}}
URL: {{url}}
{{/if}}
AutoReq: {{auto_req}}
AutoProv: {{auto_prov}}
{{#each requires}}
Requires: {{this}}
{{/each}}

%define _build_id_links none
%global debug_package %{nil}
%global __os_install_post %{nil}

%description
{{description}}

%files
%dir "{{install_dir}}"
{{#each files}}
"{{this}}"
{{/each}}
"#;

#[derive(Serialize)]
struct SpecContext<'a> {
    name: String,
    version: String,
    release: String,
    arch: &'a str,
    summary: &'a str,
    license: &'a str,
    vendor: &'a str,
    url: &'a str,
    auto_req: &'static str,
    auto_prov: &'static str,
    requires: Vec<String>,
    description: String,
    install_dir: String,
    files: Vec<String>,
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// `buildroot/opt/<AppId>` inside `root`.
pub fn layout(root: &Path, config: &Configuration) -> StageLayout {
    let build_root = root.join("buildroot");
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

fn spec_path(ctx: &BuildContext) -> PathBuf {
    ctx.root
        .join("SPECS")
        .join(format!("{}.spec", package_id(&ctx.config)))
}

/// Renders the spec file.
pub fn spec_file(ctx: &BuildContext, files: &[PathBuf]) -> Result<String> {
    let conf = &ctx.config;
    let description = if conf.app_description.trim().is_empty() {
        conf.app_short_summary.trim().to_string()
    } else {
        conf.app_description.trim().to_string()
    };
    let data = SpecContext {
        name: package_id(conf),
        version: ctx.app_version.replace('-', "_"),
        release: ctx.package_release.replace('-', "_"),
        arch: ctx.runtime.arch.rpm(),
        summary: conf.app_short_summary.trim(),
        license: conf.app_license_id.trim(),
        vendor: conf.publisher_name.trim(),
        url: conf.publisher_link_url.trim(),
        auto_req: yes_no(conf.rpm_auto_req),
        auto_prov: yes_no(conf.rpm_auto_prov),
        requires: split_list(&conf.rpm_requires),
        description,
        install_dir: ctx.layout.install_bin.clone(),
        files: files
            .iter()
            .map(|f| format!("/{}", f.to_string_lossy().replace('\\', "/")))
            .collect(),
    };
    templates::render("rpm.spec", SPEC_TEMPLATE, &data)
}

/// Writes `SPECS/<package>.spec`.
pub async fn write_manifest(ctx: &BuildContext) -> Result<()> {
    let files = freedesktop::staged_files(&ctx.layout.build_root)?;
    let spec = spec_file(ctx, &files)?;
    let path = spec_path(ctx);
    fs::write_file(&path, spec)
        .await
        .context("failed to write spec file")?;
    log::debug!("Wrote {} ({} files)", path.display(), files.len());
    Ok(())
}

/// Runs `rpmbuild` and returns the package it wrote.
pub async fn invoke(ctx: &BuildContext, runner: &dyn ToolRunner) -> Result<PathBuf> {
    let top_dir = ctx.root.join("rpmbuild");
    fs::create_dir_all(&top_dir, true).await?;

    let invocation = ToolInvocation::new("rpmbuild")
        .arg("-bb")
        .arg(spec_path(ctx))
        .arg("--define")
        .arg(format!("_topdir {}", top_dir.display()))
        .arg("--buildroot")
        .arg(&ctx.layout.build_root)
        .arg("--target")
        .arg(ctx.runtime.arch.rpm())
        .cwd(&ctx.root)
        .envs(ctx.macros.env());
    runner.run(&invocation).await?;

    find_rpm(&top_dir.join("RPMS"))
}

fn find_rpm(rpms: &Path) -> Result<PathBuf> {
    let pattern = rpms.join("**").join("*.rpm");
    let pattern = pattern.to_string_lossy();
    glob::glob(&pattern)?
        .filter_map(|e| e.ok())
        .next()
        .ok_or_else(|| Error::NotFound {
            what: "rpmbuild output".into(),
            path: rpms.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::platform::{Arch, OsFamily, PackageType, Runtime};

    #[tokio::test]
    async fn spec_lists_requirements_and_quoted_files() {
        let mut conf = Configuration::default();
        conf.app_version_release = "2.0.0-beta[3]".into();
        let runtime = Runtime {
            os: OsFamily::Linux,
            arch: Arch::X64,
        };
        let ctx = BuildContext::for_test(conf, PackageType::Rpm, runtime, Path::new("/tmp/rpm")).await;
        let files = vec![
            PathBuf::from("opt/com.example.helloworld/HelloWorld"),
            PathBuf::from("usr/share/applications/com.example.helloworld.desktop"),
        ];

        let spec = spec_file(&ctx, &files).unwrap();
        assert!(spec.starts_with("Name: helloworld\n"));
        assert!(spec.contains("Version: 2.0.0_beta\n"));
        assert!(spec.contains("Release: 3\n"));
        assert!(spec.contains("BuildArch: x86_64\n"));
        assert!(spec.contains("AutoReq: no\nAutoProv: yes\n"));
        assert!(spec.contains("Requires: krb5-libs\nRequires: libicu\n"));
        assert!(spec.contains("%dir \"/opt/com.example.helloworld\"\n"));
        assert!(spec.contains("\"/opt/com.example.helloworld/HelloWorld\"\n"));
        assert!(spec.contains("%global debug_package %{nil}"));
    }
}
