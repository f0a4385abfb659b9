//! Per-run state shared by every build stage.
//!
//! A [`BuildContext`] is created by the Init stage. It owns the temporary
//! root (`<tmp>/netloy/<AppBaseName>/<format>`, recreated empty each run),
//! the split version, the resolved project file, the deterministic output
//! path and the [`MacroRegistry`]. Nothing in it changes after construction.

use crate::bundler::{
    error::{Context as _, Error, ErrorExt, Result},
    interaction::Interaction,
    macros::{MacroId, MacroRegistry},
    platform::{OsFamily, PackageType, Runtime},
    resources::appstream,
    settings::Configuration,
};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Options chosen on the command line for one build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Format to produce.
    pub package_type: PackageType,
    /// Target runtime; defaults to the host architecture.
    pub runtime: Option<Runtime>,
    /// `dotnet publish -c` value.
    pub build_config: String,
    /// Explicit output file, or file name placed in the output directory.
    pub output: Option<PathBuf>,
    /// Delete the temporary root after a successful build.
    pub clean: bool,
    /// Base for temporary roots; the system temp directory when `None`.
    pub temp_base: Option<PathBuf>,
}

impl BuildOptions {
    /// Release build of `package_type` for the host runtime.
    pub fn new(package_type: PackageType) -> Self {
        Self {
            package_type,
            runtime: None,
            build_config: "Release".to_string(),
            output: None,
            clean: false,
            temp_base: None,
        }
    }
}

/// Directories a format lays out inside the temporary root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLayout {
    /// Root of the tree handed to the packaging tool (`${BUILD_ROOT}`).
    pub build_root: PathBuf,
    /// Where `dotnet publish` writes.
    pub publish_dir: PathBuf,
    /// Install location of the binaries on the target system (`${INSTALL_BIN}`).
    pub install_bin: String,
}

/// Immutable state of one build.
#[derive(Debug)]
pub struct BuildContext {
    /// Validated configuration.
    pub config: Configuration,
    /// Format being built.
    pub package_type: PackageType,
    /// Target runtime.
    pub runtime: Runtime,
    /// `dotnet publish -c` value.
    pub build_config: String,
    /// `<tmp>/netloy/<AppBaseName>/<format>`.
    pub root: PathBuf,
    /// Format-specific directories under [`root`](Self::root).
    pub layout: StageLayout,
    /// Version part of `AppVersionRelease`.
    pub app_version: String,
    /// Release part of `AppVersionRelease`.
    pub package_release: String,
    /// Executable file name (`AppBaseName`, plus `.exe` for Windows runtimes).
    pub exec_name: String,
    /// Resolved project file.
    pub project: PathBuf,
    /// Final artifact path.
    pub output_path: PathBuf,
    /// Macro values for templates and child processes.
    pub macros: MacroRegistry,
}

impl BuildContext {
    /// Runs the Init stage.
    ///
    /// Recreates the temporary root, splits the version, resolves the
    /// project file and seeds every macro.
    pub async fn init(
        config: Configuration,
        options: &BuildOptions,
        runtime: Runtime,
        interaction: &Interaction,
    ) -> Result<Self> {
        let package_type = options.package_type;
        let root = temp_root(options, &config);

        if root.exists() {
            tokio::fs::remove_dir_all(&root)
                .await
                .fs_context("removing previous build root", &root)?;
        }
        tokio::fs::create_dir_all(&root)
            .await
            .fs_context("creating build root", &root)?;
        log::debug!("Build root: {}", root.display());

        let (app_version, package_release) = split_version(&config.app_version_release);
        let exec_name = executable_name(&config.app_base_name, runtime);
        let layout = crate::bundler::builder::layout(package_type, &root, &config);
        let project = resolve_project(&config, interaction).await?;
        let output_path = output_path(&config, options, runtime, &app_version, &package_release)?;

        let mut ctx = Self {
            config,
            package_type,
            runtime,
            build_config: options.build_config.clone(),
            root,
            layout,
            app_version,
            package_release,
            exec_name,
            project,
            output_path,
            macros: MacroRegistry::new(macro_family(package_type, runtime)),
        };
        ctx.seed_macros().await;
        Ok(ctx)
    }

    async fn seed_macros(&mut self) {
        let now = chrono::Local::now();
        let conf = &self.config;
        let m = &mut self.macros;

        m.set(MacroId::BuildDate, now.format("%Y-%m-%d").to_string());
        m.set(MacroId::BuildYear, now.format("%Y").to_string());
        m.set(MacroId::BuildTarget, &self.build_config);
        m.set(MacroId::BuildArch, crate::bundler::builder::arch_name(self.package_type, self.runtime.arch));
        m.set(MacroId::BuildRoot, self.layout.build_root.to_string_lossy());
        m.set(MacroId::DotnetRuntime, self.runtime.to_string());
        m.set(MacroId::LocalDirectory, conf.local_directory().to_string_lossy());

        m.set(MacroId::AppBaseName, &conf.app_base_name);
        m.set(MacroId::AppFriendlyName, &conf.app_friendly_name);
        m.set(MacroId::AppId, &conf.app_id);
        m.set(MacroId::AppShortSummary, &conf.app_short_summary);
        m.set(MacroId::AppLicenseId, &conf.app_license_id);
        m.set(MacroId::AppVersion, &self.app_version);
        m.set(MacroId::PackageRelease, &self.package_release);

        m.set(MacroId::PublisherName, &conf.publisher_name);
        m.set(MacroId::PublisherId, &conf.publisher_id);
        m.set(MacroId::PublisherLinkName, &conf.publisher_link_name);
        m.set(MacroId::PublisherLinkUrl, &conf.publisher_link_url);
        m.set(MacroId::PublisherEmail, &conf.publisher_email);
        m.set(MacroId::PublisherCopyright, &conf.publisher_copyright);

        m.set(MacroId::DesktopNoDisplay, conf.desktop_no_display.to_string());
        m.set(MacroId::DesktopTerminal, conf.desktop_terminal.to_string());
        m.set(MacroId::PrimeCategory, &conf.prime_category);

        let publish_bin = self.layout.publish_dir.join(&self.exec_name);
        m.set(MacroId::PublishBin, publish_bin.to_string_lossy());
        m.set(MacroId::InstallBin, &self.layout.install_bin);
        m.set(
            MacroId::InstallExec,
            join_install(&self.layout.install_bin, &self.exec_name, self.runtime.os),
        );

        let description = appstream::description_xml(&conf.app_description, &conf.app_short_summary);
        m.set(MacroId::AppStreamDescriptionXml, description);

        let changelog = match Configuration::optional_path(&conf.app_change_file) {
            Some(path) => match tokio::fs::read_to_string(path).await {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Could not read change file {}: {}", path.display(), e);
                    String::new()
                }
            },
            None => String::new(),
        };
        let date = m.get(MacroId::BuildDate);
        m.set(
            MacroId::AppStreamChangelogXml,
            appstream::changelog_xml(&changelog, &self.app_version, &date),
        );
    }

    /// Context rooted at `root` without touching the disk or finding a project.
    #[cfg(test)]
    pub(crate) async fn for_test(
        config: Configuration,
        package_type: PackageType,
        runtime: Runtime,
        root: &Path,
    ) -> Self {
        let (app_version, package_release) = split_version(&config.app_version_release);
        let output_name =
            output_file_name(&config, package_type, runtime, &app_version, &package_release);
        let mut ctx = Self {
            package_type,
            runtime,
            build_config: "Release".to_string(),
            root: root.to_path_buf(),
            layout: crate::bundler::builder::layout(package_type, root, &config),
            exec_name: executable_name(&config.app_base_name, runtime),
            project: root.join("App.csproj"),
            output_path: root.join("out").join(output_name),
            macros: MacroRegistry::new(macro_family(package_type, runtime)),
            app_version,
            package_release,
            config,
        };
        ctx.seed_macros().await;
        ctx
    }

    /// Expands macros in `text`.
    pub fn expand(&self, text: &str) -> String {
        self.macros.expand(text)
    }

    /// Path inside the root where a tool should write the artifact before it
    /// is moved to [`output_path`](Self::output_path).
    pub fn staged_output(&self) -> PathBuf {
        match self.output_path.file_name() {
            Some(name) => self.root.join(name),
            None => self.root.join(format!("artifact.{}", self.package_type.short_name())),
        }
    }

    /// The target's `PATH` command for Linux launchers, if configured.
    pub fn launcher_command(&self) -> Option<&str> {
        self.config.launcher_command()
    }
}

/// `<tmp>/netloy/<AppBaseName>/<format>` for a build.
pub fn temp_root(options: &BuildOptions, config: &Configuration) -> PathBuf {
    options
        .temp_base
        .clone()
        .unwrap_or_else(std::env::temp_dir)
        .join("netloy")
        .join(&config.app_base_name)
        .join(options.package_type.short_name())
}

/// Splits `VERSION[RELEASE]` into its parts.
///
/// The release defaults to `"1"`. A stray `]` without `[` is dropped.
pub fn split_version(value: &str) -> (String, String) {
    let value = value.trim();
    match value.split_once('[') {
        Some((version, rest)) => {
            let release = rest.trim_end_matches(']').trim();
            let release = if release.is_empty() { "1" } else { release };
            (version.trim().to_string(), release.to_string())
        }
        None => (value.replace(']', "").trim().to_string(), "1".to_string()),
    }
}

/// Executable file name for a runtime.
pub fn executable_name(base_name: &str, runtime: Runtime) -> String {
    match runtime.os {
        OsFamily::Windows => format!("{base_name}.exe"),
        _ => base_name.to_string(),
    }
}

fn macro_family(package_type: PackageType, runtime: Runtime) -> OsFamily {
    package_type.host_os().unwrap_or(runtime.os)
}

fn join_install(install_bin: &str, exec: &str, os: OsFamily) -> String {
    let sep = if os == OsFamily::Windows { '\\' } else { '/' };
    if install_bin.is_empty() {
        exec.to_string()
    } else {
        format!("{}{sep}{exec}", install_bin.trim_end_matches(['/', '\\']))
    }
}

/// File extension of the final artifact.
pub fn artifact_extension(package_type: PackageType, runtime: Runtime) -> &'static str {
    match package_type {
        PackageType::Exe => "exe",
        PackageType::Msi => "msi",
        PackageType::MacOsBundle => "app.zip",
        PackageType::Dmg => "dmg",
        PackageType::AppImage => "AppImage",
        PackageType::Deb => "deb",
        PackageType::Rpm => "rpm",
        PackageType::Pacman => "pkg.tar.zst",
        PackageType::Flatpak => "flatpak",
        PackageType::Portable if runtime.os == OsFamily::Windows => "zip",
        PackageType::Portable => "tar.gz",
    }
}

/// Deterministic output file name.
///
/// `<PackageName>.<Version>-<Release>.<Runtime>.<ext>`; AppImage and setup
/// files drop the version unless their `VersionOutput` flag is set, and
/// setup files append `SetupSuffixOutput` to the package name.
pub fn output_file_name(
    config: &Configuration,
    package_type: PackageType,
    runtime: Runtime,
    version: &str,
    release: &str,
) -> String {
    let ext = artifact_extension(package_type, runtime);
    let mut name = config.package_name().to_string();
    let with_version = match package_type {
        PackageType::AppImage => config.app_image_version_output,
        PackageType::Exe => {
            name.push_str(config.setup_suffix_output.trim());
            config.setup_version_output
        }
        _ => true,
    };
    if with_version {
        format!("{name}.{version}-{release}.{runtime}.{ext}")
    } else {
        format!("{name}.{runtime}.{ext}")
    }
}

fn output_path(
    config: &Configuration,
    options: &BuildOptions,
    runtime: Runtime,
    version: &str,
    release: &str,
) -> Result<PathBuf> {
    let out_dir = config.output_directory();
    let default_name =
        || output_file_name(config, options.package_type, runtime, version, release);

    let Some(explicit) = &options.output else {
        return Ok(out_dir.join(default_name()));
    };

    if explicit.is_dir() {
        return Ok(explicit.join(default_name()));
    }
    let has_dir = explicit
        .parent()
        .is_some_and(|p| !p.as_os_str().is_empty());
    if has_dir {
        Ok(explicit
            .absolutize()
            .fs_context("resolving output path", explicit)?
            .into_owned())
    } else {
        Ok(out_dir.join(explicit))
    }
}

/// Finds the project to publish.
///
/// An explicit `.csproj` path wins. Otherwise the configured directory (or
/// the configuration directory) is searched for `*.csproj`; several matches
/// are confirmed one by one, or the first is taken when unattended.
pub async fn resolve_project(config: &Configuration, interaction: &Interaction) -> Result<PathBuf> {
    let search_dir = match Configuration::optional_path(&config.dotnet_project_path) {
        Some(path) if path.is_file() => return Ok(path.to_path_buf()),
        Some(path) if path.is_dir() => path.to_path_buf(),
        Some(path) => {
            return Err(Error::NotFound {
                what: "DotnetProjectPath".into(),
                path: path.to_path_buf(),
            });
        }
        None => config.local_directory(),
    };

    let mut candidates = find_projects(&search_dir)?;
    match candidates.len() {
        0 => Err(Error::NotFound {
            what: "*.csproj project file".into(),
            path: search_dir,
        }),
        1 => Ok(candidates.remove(0)),
        _ => {
            if interaction.is_unattended() {
                log::warn!(
                    "{} projects found in {}; using {}",
                    candidates.len(),
                    search_dir.display(),
                    candidates[0].display()
                );
                return Ok(candidates.remove(0));
            }
            for candidate in &candidates {
                if interaction.confirm(&format!("Publish project {}?", candidate.display())) {
                    return Ok(candidate.clone());
                }
            }
            Err(Error::UserCancelled(format!(
                "no project selected in {}",
                search_dir.display()
            )))
        }
    }
}

fn find_projects(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.csproj");
    let pattern = pattern
        .to_str()
        .context("project search path is not valid UTF-8")?;
    let mut found: Vec<PathBuf> = glob::glob(pattern)?.filter_map(|e| e.ok()).collect();
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::platform::Arch;
    use std::sync::Arc;

    fn linux_x64() -> Runtime {
        Runtime {
            os: OsFamily::Linux,
            arch: Arch::X64,
        }
    }

    #[test]
    fn version_and_release_split() {
        assert_eq!(split_version("1.2.3[4]"), ("1.2.3".into(), "4".into()));
        assert_eq!(split_version("1.2.3"), ("1.2.3".into(), "1".into()));
        assert_eq!(split_version("1.2.3]").0, "1.2.3");
        assert_eq!(split_version(" 2.0[] "), ("2.0".into(), "1".into()));
    }

    #[test]
    fn deterministic_output_names() {
        let conf = Configuration::default();
        assert_eq!(
            output_file_name(&conf, PackageType::Deb, linux_x64(), "1.0.0", "1"),
            "HelloWorld.1.0.0-1.linux-x64.deb"
        );
        assert_eq!(
            output_file_name(&conf, PackageType::AppImage, linux_x64(), "1.0.0", "1"),
            "HelloWorld.linux-x64.AppImage"
        );
        let win = Runtime {
            os: OsFamily::Windows,
            arch: Arch::X64,
        };
        let mut conf = conf;
        conf.setup_suffix_output = "Setup".into();
        conf.setup_version_output = true;
        assert_eq!(
            output_file_name(&conf, PackageType::Exe, win, "1.0.0", "2"),
            "HelloWorldSetup.1.0.0-2.win-x64.exe"
        );
        assert_eq!(
            output_file_name(&conf, PackageType::Portable, win, "1.0.0", "2"),
            "HelloWorld.1.0.0-2.win-x64.zip"
        );
    }

    #[test]
    fn windows_executables_get_extension() {
        let win = Runtime {
            os: OsFamily::Windows,
            arch: Arch::Arm64,
        };
        assert_eq!(executable_name("App", win), "App.exe");
        assert_eq!(executable_name("App", linux_x64()), "App");
    }

    #[tokio::test]
    async fn single_project_is_found() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("Hello.csproj"), "<Project/>").unwrap();
        let mut conf = Configuration::default();
        conf.source_path = tmp.path().join("app.netloy");
        let found = resolve_project(&conf, &Interaction::unattended()).await.unwrap();
        assert_eq!(found, tmp.path().join("Hello.csproj"));
    }

    #[tokio::test]
    async fn several_projects_use_first_when_unattended() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("B.csproj"), "").unwrap();
        std::fs::write(tmp.path().join("A.csproj"), "").unwrap();
        let mut conf = Configuration::default();
        conf.source_path = tmp.path().join("app.netloy");
        let found = resolve_project(&conf, &Interaction::unattended()).await.unwrap();
        assert_eq!(found, tmp.path().join("A.csproj"));

        let refuse = Interaction::new(false, Arc::new(|_| false));
        let err = resolve_project(&conf, &refuse).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let mut conf = Configuration::default();
        conf.source_path = tmp.path().join("app.netloy");
        let err = resolve_project(&conf, &Interaction::unattended()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
