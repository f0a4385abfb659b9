//! Inno Setup installer (.exe) builder.
//!
//! Generates `setup.iss` and compiles it with `iscc`. Paths that combine an
//! Inno constant with a name (`{app}\App.exe`) are built in Rust, since a
//! backslash directly before `{{` would escape the handlebars expression.

use crate::bundler::{
    context::{BuildContext, StageLayout},
    error::{Context, Result},
    resources::templates,
    settings::Configuration,
    utils::{
        fs,
        process::{ToolInvocation, ToolRunner},
    },
};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{numeric_version, publish_dir, setup_icon, write_utf8_bom};

const ISS_TEMPLATE: &str = r#"; Generated by netloy
[Setup]
AppId={{app_id}}
AppName={{friendly_name}}
AppVersion={{version}}
AppVerName={{friendly_name}} {{version}}
VersionInfoVersion={{numeric_version}}
AppPublisher={{publisher}}
AppCopyright={{copyright}}
{{#if url}}
AppPublisherURL={{url}}
AppSupportURL={{url}}
{{/if}}
DefaultDirName={{default_dir}}
DefaultGroupName={{group}}
DisableProgramGroupPage=yes
PrivilegesRequired={{privileges}}
{{#if arch_allowed}}
ArchitecturesAllowed={{arch_allowed}}
ArchitecturesInstallIn64BitMode={{arch_allowed}}
{{/if}}
{{#if min_windows}}
MinVersion={{min_windows}}
{{/if}}
OutputDir={{output_dir}}
OutputBaseFilename={{output_base}}
{{#if icon}}
SetupIconFile={{icon}}
{{/if}}
{{#if license}}
LicenseFile={{license}}
{{/if}}
{{#if sign_tool}}
SignTool={{sign_tool}}
{{/if}}
UninstallDisplayIcon={{app_exec}}
Compression=lzma2
SolidCompression=yes
WizardStyle=modern

[Files]
Source: "{{publish_glob}}"; DestDir: "{app}"; Flags: ignoreversion recursesubdirs createallsubdirs

[Icons]
Name: "{{menu_link}}"; Filename: "{{app_exec}}"
{{#if prompt_link}}
Name: "{{prompt_link}}"; Filename: "{cmd}"; Parameters: "/k cd /d ""{app}"""; WorkingDir: "{app}"
{{/if}}

[Run]
Filename: "{{app_exec}}"; Description: "Launch {{friendly_name}}"; Flags: nowait postinstall skipifsilent
"#;

#[derive(Serialize)]
struct IssContext {
    app_id: String,
    friendly_name: String,
    version: String,
    numeric_version: String,
    publisher: String,
    copyright: String,
    url: String,
    default_dir: String,
    group: String,
    privileges: &'static str,
    arch_allowed: &'static str,
    min_windows: String,
    output_dir: String,
    output_base: String,
    icon: String,
    license: String,
    sign_tool: String,
    app_exec: String,
    publish_glob: String,
    menu_link: String,
    prompt_link: String,
}

/// `<root>/publish`; the installer installs into `{app}`.
pub fn layout(root: &Path, _config: &Configuration) -> StageLayout {
    StageLayout {
        build_root: root.to_path_buf(),
        publish_dir: publish_dir(root),
        install_bin: "{app}".to_string(),
    }
}

/// Nothing to stage beyond the publish output.
pub async fn stage(ctx: &BuildContext) -> Result<()> {
    if setup_icon(&ctx.config).is_none() {
        log::warn!("No .ico icon configured; the installer will use the default icon");
    }
    Ok(())
}

fn output_dir(ctx: &BuildContext) -> PathBuf {
    ctx.root.join("out")
}

fn output_base(ctx: &BuildContext) -> String {
    ctx.staged_output()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| ctx.config.app_base_name.clone())
}

fn display(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

/// Renders `setup.iss`.
pub fn script(ctx: &BuildContext) -> Result<String> {
    let conf = &ctx.config;
    let publisher = conf.publisher_name.trim();
    let group = conf.setup_group_name().trim().to_string();
    let arch_allowed = match ctx.runtime.arch.windows() {
        "x64" => "x64compatible",
        "arm64" => "arm64",
        _ => "",
    };
    let prompt = conf.setup_command_prompt.trim();

    let data = IssContext {
        app_id: conf.app_id.clone(),
        friendly_name: conf.app_friendly_name.trim().to_string(),
        version: ctx.app_version.clone(),
        numeric_version: numeric_version(&ctx.app_version),
        publisher: publisher.to_string(),
        copyright: ctx.expand(&conf.publisher_copyright),
        url: conf.publisher_link_url.trim().to_string(),
        default_dir: format!("{{autopf}}\\{}\\{}", publisher, conf.app_friendly_name.trim()),
        group: group.clone(),
        privileges: if conf.setup_admin_install { "admin" } else { "lowest" },
        arch_allowed,
        min_windows: conf.setup_min_windows_version.trim().to_string(),
        output_dir: output_dir(ctx).display().to_string(),
        output_base: output_base(ctx),
        icon: display(setup_icon(conf)),
        license: display(Configuration::optional_path(&conf.app_license_file)),
        sign_tool: ctx.expand(conf.setup_sign_tool.trim()),
        app_exec: format!("{{app}}\\{}", ctx.exec_name),
        publish_glob: format!("{}\\*", ctx.layout.publish_dir.display()),
        menu_link: format!("{{group}}\\{}", conf.app_friendly_name.trim()),
        prompt_link: if prompt.is_empty() {
            String::new()
        } else {
            format!("{{group}}\\{prompt}")
        },
    };
    templates::render("setup.iss", ISS_TEMPLATE, &data)
}

/// Writes `setup.iss` with a byte order mark and CRLF line endings.
pub async fn write_manifest(ctx: &BuildContext) -> Result<()> {
    let path = ctx.root.join("setup.iss");
    write_utf8_bom(&path, &script(ctx)?)
        .await
        .context("failed to write setup.iss")?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Compiles the script with `iscc`.
pub async fn invoke(ctx: &BuildContext, runner: &dyn ToolRunner) -> Result<PathBuf> {
    let out = output_dir(ctx);
    fs::create_dir_all(&out, true).await?;

    let invocation = ToolInvocation::new("iscc")
        .arg("/Qp")
        .arg(ctx.root.join("setup.iss"))
        .cwd(&ctx.root)
        .envs(ctx.macros.env());
    runner.run(&invocation).await?;
    Ok(out.join(format!("{}.exe", output_base(ctx))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::platform::{Arch, OsFamily, PackageType, Runtime};

    async fn context(arch: Arch, admin: bool) -> BuildContext {
        let mut conf = Configuration::default();
        conf.setup_admin_install = admin;
        conf.setup_command_prompt = "Command Prompt".into();
        let runtime = Runtime {
            os: OsFamily::Windows,
            arch,
        };
        BuildContext::for_test(conf, PackageType::Exe, runtime, Path::new("C:/build")).await
    }

    #[tokio::test]
    async fn script_uses_inno_constants_for_paths() {
        let ctx = context(Arch::X64, false).await;
        let iss = script(&ctx).unwrap();
        assert!(iss.contains("DefaultDirName={autopf}\\Example Publisher\\Hello World\n"));
        assert!(iss.contains("UninstallDisplayIcon={app}\\HelloWorld.exe\n"));
        assert!(iss.contains("Name: \"{group}\\Hello World\"; Filename: \"{app}\\HelloWorld.exe\""));
        assert!(iss.contains("Name: \"{group}\\Command Prompt\"; Filename: \"{cmd}\""));
        assert!(iss.contains("ArchitecturesAllowed=x64compatible\n"));
        assert!(iss.contains("PrivilegesRequired=lowest\n"));
        assert!(iss.contains("VersionInfoVersion=1.0.0.0\n"));
        assert!(iss.contains("OutputBaseFilename=HelloWorld.win-x64\n"));
        assert!(!iss.contains("{{"));
    }

    #[tokio::test]
    async fn x86_admin_install_has_no_architecture_limits() {
        let ctx = context(Arch::X86, true).await;
        let iss = script(&ctx).unwrap();
        assert!(!iss.contains("ArchitecturesAllowed"));
        assert!(iss.contains("PrivilegesRequired=admin\n"));
    }
}
