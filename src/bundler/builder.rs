//! Build orchestration.
//!
//! A [`Bundler`] runs one format through the fixed stage sequence
//! Init → Publish → Stage → Manifest → Invoke → Finalize. Each format module
//! under [`platform`](crate::bundler::platform) supplies the layout, staging,
//! manifest and tool invocation for its format; this module dispatches to
//! them and owns everything the formats share.
//!
//! # Example
//!
//! ```no_run
//! use netloy::bundler::{
//!     BuildOptions, Bundler, Interaction, PackageType, SystemRunner, settings::parser,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> netloy::bundler::Result<()> {
//! let interaction = Interaction::unattended();
//! let config = parser::parse("app.netloy".as_ref(), &interaction).await?;
//! let runner = Arc::new(SystemRunner::default());
//!
//! let bundler = Bundler::new(config, BuildOptions::new(PackageType::Deb), interaction, runner)?;
//! bundler.validate().await?;
//! let artifact = bundler.build().await?;
//! println!("{} ({} bytes, sha256 {})", artifact.paths[0].display(), artifact.size, artifact.checksum);
//! # Ok(())
//! # }
//! ```

use crate::bundler::{
    BundledArtifact,
    context::{BuildContext, BuildOptions, StageLayout, temp_root},
    error::{Error, ErrorExt, Result},
    factory::{self, Host},
    interaction::Interaction,
    platform::{Arch, PackageType, Runtime, linux, macos, portable, windows},
    publish,
    settings::Configuration,
    utils::{fs, process::ToolRunner},
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Runs the build pipeline for one format.
pub struct Bundler {
    config: Configuration,
    options: BuildOptions,
    runtime: Runtime,
    interaction: Interaction,
    runner: Arc<dyn ToolRunner>,
}

impl std::fmt::Debug for Bundler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("package_type", &self.options.package_type)
            .field("runtime", &self.runtime)
            .field("interaction", &self.interaction)
            .finish_non_exhaustive()
    }
}

impl Bundler {
    /// Creates a bundler for the current host.
    ///
    /// Fails with [`Error::UnsupportedPlatform`] when the format cannot be
    /// built here or the runtime is not valid for it.
    pub fn new(
        config: Configuration,
        options: BuildOptions,
        interaction: Interaction,
        runner: Arc<dyn ToolRunner>,
    ) -> Result<Self> {
        Self::for_host(config, options, interaction, runner, Host::current())
    }

    /// Creates a bundler as if running on `host`.
    pub fn for_host(
        config: Configuration,
        options: BuildOptions,
        interaction: Interaction,
        runner: Arc<dyn ToolRunner>,
        host: Host,
    ) -> Result<Self> {
        let runtime = factory::select_runtime(options.package_type, options.runtime, host)?;
        Ok(Self {
            config,
            options,
            runtime,
            interaction,
            runner,
        })
    }

    /// Format being built.
    pub fn package_type(&self) -> PackageType {
        self.options.package_type
    }

    /// Target runtime chosen by the factory.
    pub fn runtime(&self) -> Runtime {
        self.runtime
    }

    /// Temporary root used by this build.
    pub fn temp_root(&self) -> PathBuf {
        temp_root(&self.options, &self.config)
    }

    /// Checks that the tools and settings the format needs are present.
    pub async fn validate(&self) -> Result<()> {
        let package_type = self.package_type();
        let mut problems = format_problems(package_type, &self.config);

        let tools = std::iter::once("dotnet").chain(required_tools(package_type, self.runtime).iter().copied());
        for tool in tools {
            if !self.runner.is_available(tool) {
                problems.push(format!("{tool} is required to build {package_type} packages but was not found"));
            }
        }

        if problems.is_empty() {
            log::debug!("{package_type} build prerequisites satisfied");
            Ok(())
        } else {
            Err(Error::ValidationFailed(problems))
        }
    }

    /// Runs every stage and returns the finished artifact.
    ///
    /// The temporary root of a failed run is left on disk.
    pub async fn build(&self) -> Result<BundledArtifact> {
        let package_type = self.package_type();
        let runner = self.runner.as_ref();

        log::info!("[init] {} for {}", package_type, self.runtime);
        let ctx = BuildContext::init(
            self.config.clone(),
            &self.options,
            self.runtime,
            &self.interaction,
        )
        .await?;

        log::info!("[publish] {}", ctx.project.display());
        publish::publish(&ctx, &self.interaction, runner).await?;

        log::info!("[stage] {}", ctx.layout.build_root.display());
        stage(&ctx).await?;

        log::info!("[manifest] {package_type}");
        write_manifest(&ctx).await?;

        log::info!("[invoke] {package_type}");
        let produced = invoke(&ctx, runner).await?;
        move_artifact(&produced, &ctx.output_path).await?;

        log::info!("[finalize] {}", ctx.output_path.display());
        let size = fs::total_size(&ctx.output_path)?;
        let checksum = calculate_sha256(&ctx.output_path).await?;
        if self.options.clean {
            fs::remove_dir_all(&ctx.root).await?;
        }

        Ok(BundledArtifact {
            package_type,
            paths: vec![ctx.output_path],
            size,
            checksum,
        })
    }

    /// Deletes the temporary root.
    pub async fn clear(&self) -> Result<()> {
        let root = self.temp_root();
        log::debug!("Removing {}", root.display());
        fs::remove_dir_all(&root).await
    }
}

/// Directories a format uses inside `root`.
pub fn layout(package_type: PackageType, root: &Path, config: &Configuration) -> StageLayout {
    match package_type {
        PackageType::Deb => linux::debian::layout(root, config),
        PackageType::Rpm => linux::rpm::layout(root, config),
        PackageType::Pacman => linux::pacman::layout(root, config),
        PackageType::AppImage => linux::appimage::layout(root, config),
        PackageType::Flatpak => linux::flatpak::layout(root, config),
        PackageType::Exe => windows::inno::layout(root, config),
        PackageType::Msi => windows::wix::layout(root, config),
        PackageType::MacOsBundle => macos::app::layout(root, config),
        PackageType::Dmg => macos::dmg::layout(root, config),
        PackageType::Portable => portable::layout(root, config),
    }
}

/// Architecture name a format's tooling expects.
pub fn arch_name(package_type: PackageType, arch: Arch) -> &'static str {
    match package_type {
        PackageType::Deb => arch.debian(),
        PackageType::Rpm => arch.rpm(),
        PackageType::Pacman => arch.pacman(),
        PackageType::AppImage => arch.appimage(),
        PackageType::Flatpak => arch.flatpak(),
        PackageType::Exe | PackageType::Msi => arch.windows(),
        PackageType::MacOsBundle | PackageType::Dmg => arch.macos(),
        PackageType::Portable => arch.rid_suffix(),
    }
}

/// Native tools a format invokes, besides `dotnet`.
pub fn required_tools(package_type: PackageType, runtime: Runtime) -> &'static [&'static str] {
    match package_type {
        PackageType::Deb => &["dpkg-deb"],
        PackageType::Rpm => &["rpmbuild"],
        PackageType::Pacman => &["makepkg"],
        PackageType::AppImage => &["appimagetool"],
        PackageType::Flatpak => &["flatpak-builder", "flatpak"],
        PackageType::Exe => &["iscc"],
        PackageType::Msi => &["wix"],
        PackageType::MacOsBundle => &["ditto"],
        PackageType::Dmg => &["hdiutil"],
        PackageType::Portable => portable::tools(runtime),
    }
}

fn format_problems(package_type: PackageType, config: &Configuration) -> Vec<String> {
    match package_type {
        PackageType::Flatpak => linux::flatpak::check(config),
        _ => Vec::new(),
    }
}

async fn stage(ctx: &BuildContext) -> Result<()> {
    match ctx.package_type {
        PackageType::Deb => linux::debian::stage(ctx).await,
        PackageType::Rpm => linux::rpm::stage(ctx).await,
        PackageType::Pacman => linux::pacman::stage(ctx).await,
        PackageType::AppImage => linux::appimage::stage(ctx).await,
        PackageType::Flatpak => linux::flatpak::stage(ctx).await,
        PackageType::Exe => windows::inno::stage(ctx).await,
        PackageType::Msi => windows::wix::stage(ctx).await,
        PackageType::MacOsBundle => macos::app::stage(ctx).await,
        PackageType::Dmg => macos::dmg::stage(ctx).await,
        PackageType::Portable => portable::stage(ctx).await,
    }
}

async fn write_manifest(ctx: &BuildContext) -> Result<()> {
    match ctx.package_type {
        PackageType::Deb => linux::debian::write_manifest(ctx).await,
        PackageType::Rpm => linux::rpm::write_manifest(ctx).await,
        PackageType::Pacman => linux::pacman::write_manifest(ctx).await,
        PackageType::AppImage => linux::appimage::write_manifest(ctx).await,
        PackageType::Flatpak => linux::flatpak::write_manifest(ctx).await,
        PackageType::Exe => windows::inno::write_manifest(ctx).await,
        PackageType::Msi => windows::wix::write_manifest(ctx).await,
        PackageType::MacOsBundle => macos::app::write_manifest(ctx).await,
        PackageType::Dmg => macos::dmg::write_manifest(ctx).await,
        PackageType::Portable => Ok(()),
    }
}

async fn invoke(ctx: &BuildContext, runner: &dyn ToolRunner) -> Result<PathBuf> {
    let produced = match ctx.package_type {
        PackageType::Deb => linux::debian::invoke(ctx, runner).await?,
        PackageType::Rpm => linux::rpm::invoke(ctx, runner).await?,
        PackageType::Pacman => linux::pacman::invoke(ctx, runner).await?,
        PackageType::AppImage => linux::appimage::invoke(ctx, runner).await?,
        PackageType::Flatpak => linux::flatpak::invoke(ctx, runner).await?,
        PackageType::Exe => windows::inno::invoke(ctx, runner).await?,
        PackageType::Msi => windows::wix::invoke(ctx, runner).await?,
        PackageType::MacOsBundle => macos::app::invoke(ctx, runner).await?,
        PackageType::Dmg => macos::dmg::invoke(ctx, runner).await?,
        PackageType::Portable => portable::invoke(ctx, runner).await?,
    };
    if !produced.exists() {
        return Err(Error::NotFound {
            what: format!("{} output", ctx.package_type),
            path: produced,
        });
    }
    Ok(produced)
}

/// Moves the tool's output to its final path, replacing any previous file.
async fn move_artifact(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating output directory", parent)?;
    }
    if to.is_file() {
        tokio::fs::remove_file(to)
            .await
            .fs_context("replacing previous artifact", to)?;
    }
    if tokio::fs::rename(from, to).await.is_err() {
        // rename fails across file systems
        tokio::fs::copy(from, to)
            .await
            .fs_context("copying artifact", from)?;
        tokio::fs::remove_file(from)
            .await
            .fs_context("removing staged artifact", from)?;
    }
    log::debug!("Moved {} to {}", from.display(), to.display());
    Ok(())
}

/// Hex-encoded SHA-256 of a file.
async fn calculate_sha256(path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};
    use tokio::io::AsyncReadExt;

    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening artifact for hashing", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading artifact for hashing", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::platform::OsFamily;

    #[tokio::test]
    async fn sha256_of_known_content() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        std::fs::write(&file, "abc").unwrap();
        assert_eq!(
            calculate_sha256(&file).await.unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn artifact_replaces_previous_output() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tmp.path().join("stage/pkg.deb");
        let to = tmp.path().join("out/pkg.deb");
        fs::write_file(&from, "new").await.unwrap();
        fs::write_file(&to, "old").await.unwrap();
        move_artifact(&from, &to).await.unwrap();
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "new");
        assert!(!from.exists());
    }

    #[test]
    fn every_format_has_tools_and_arch_names() {
        let rt = Runtime {
            os: OsFamily::Linux,
            arch: Arch::X64,
        };
        for t in PackageType::ALL {
            assert!(!required_tools(t, rt).is_empty(), "{t}");
        }
        assert_eq!(arch_name(PackageType::Deb, Arch::X64), "amd64");
        assert_eq!(arch_name(PackageType::Rpm, Arch::Arm64), "aarch64");
        assert_eq!(arch_name(PackageType::Pacman, Arch::Arm), "armv7h");
    }

    #[test]
    fn linux_layouts_publish_under_opt() {
        let conf = Configuration::default();
        let root = Path::new("/tmp/netloy/HelloWorld/deb");
        let layout = layout(PackageType::Deb, root, &conf);
        assert_eq!(layout.build_root, root.join("build"));
        assert_eq!(layout.publish_dir, root.join("build/opt/com.example.helloworld"));
        assert_eq!(layout.install_bin, "/opt/com.example.helloworld");
    }
}
