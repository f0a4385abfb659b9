//! Full pipeline runs against a scripted tool runner.
//!
//! The runner never starts a process. It fakes the files each tool would
//! produce so staging, manifests and finalization run for real.

use async_trait::async_trait;
use netloy::bundler::{
    Arch, BuildOptions, Bundler, Error, Host, Interaction, OsFamily, PackageType, Result,
    ToolInvocation, ToolOutput, ToolRunner, settings::parser,
};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tempfile::TempDir;

#[derive(Clone, Debug)]
struct Call {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    script: Option<String>,
}

#[derive(Default)]
struct FakeRunner {
    calls: Mutex<Vec<Call>>,
    failing: Option<&'static str>,
}

impl FakeRunner {
    fn failing(program: &'static str) -> Self {
        Self {
            failing: Some(program),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }

    fn call(&self, program: &str) -> Call {
        self.calls()
            .into_iter()
            .find(|c| c.program == program)
            .unwrap_or_else(|| panic!("{program} was not run"))
    }
}

#[async_trait]
impl ToolRunner for FakeRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let script = match invocation.program() {
            "/bin/sh" => Some(std::fs::read_to_string(&invocation.get_args()[0])?),
            _ => None,
        };
        self.calls.lock().unwrap().push(Call {
            program: invocation.program().to_string(),
            args: invocation.get_args().to_vec(),
            cwd: invocation.get_cwd().map(Path::to_path_buf),
            script,
        });

        if self.failing == Some(invocation.program()) {
            return Err(Error::ExternalToolFailed {
                tool: invocation.program().to_string(),
                code: Some(2),
                output: "simulated failure".into(),
            });
        }

        match invocation.program() {
            "dotnet" => {
                let out = PathBuf::from(invocation.arg_after("-o").expect("publish output dir"));
                std::fs::create_dir_all(&out)?;
                std::fs::write(out.join("HelloWorld"), b"#!/bin/sh\necho hello\n")?;
                std::fs::write(out.join("HelloWorld.dll"), b"not really a dll")?;
            }
            "dpkg-deb" => {
                let target = invocation.get_args().last().expect("output argument");
                std::fs::write(target, b"!<arch>\n")?;
            }
            "/bin/sh" => {}
            other => {
                return Err(Error::GenericError(format!("unexpected tool {other}")));
            }
        }
        Ok(ToolOutput::default())
    }

    fn is_available(&self, _program: &str) -> bool {
        true
    }
}

const CONFIG: &str = "\
# minimal configuration
AppBaseName = HelloWorld
AppFriendlyName = Hello World
AppId = com.example.helloworld
AppVersionRelease = 1.2.3[4]
AppShortSummary = Says hello
AppDescription = \"\"\"
    Prints a greeting.
    \"\"\"
AppLicenseId = MIT
PublisherName = Example Publisher
PublisherId = com.example
IconFiles = app.32x32.png
OutputDirectory = out
";

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        Self::with("")
    }

    /// The minimal configuration followed by `extra` lines.
    fn with(extra: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        std::fs::write(root.join("HelloWorld.csproj"), "<Project Sdk=\"Microsoft.NET.Sdk\" />").unwrap();
        image::RgbaImage::new(32, 32)
            .save(root.join("app.32x32.png"))
            .unwrap();
        std::fs::write(root.join("app.netloy"), format!("{CONFIG}{extra}")).unwrap();
        Self { dir }
    }

    fn conf(&self) -> PathBuf {
        self.dir.path().join("app.netloy")
    }

    fn work(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    fn debs(&self) -> Vec<PathBuf> {
        let out = self.dir.path().join("out");
        files_with_name(&out, |n| n.ends_with(".deb"))
    }
}

fn files_with_name(root: &Path, predicate: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| predicate(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect()
}

async fn deb_bundler(project: &Project, runner: Arc<FakeRunner>) -> Bundler {
    let interaction = Interaction::unattended();
    let config = parser::parse(&project.conf(), &interaction).await.unwrap();

    let mut options = BuildOptions::new(PackageType::Deb);
    options.temp_base = Some(project.work());

    Bundler::for_host(
        config,
        options,
        interaction,
        runner,
        Host::new(OsFamily::Linux, Arch::X64),
    )
    .unwrap()
}

#[tokio::test]
async fn debian_build_produces_one_package_and_one_control_file() {
    let project = Project::new();
    let runner = Arc::new(FakeRunner::default());
    let bundler = deb_bundler(&project, runner.clone()).await;

    bundler.validate().await.unwrap();
    let artifact = bundler.build().await.unwrap();

    let expected = project
        .dir
        .path()
        .join("out")
        .join("HelloWorld.1.2.3-4.linux-x64.deb");
    assert_eq!(artifact.package_type, PackageType::Deb);
    assert_eq!(artifact.paths, vec![expected.clone()]);
    assert!(expected.is_file());
    assert_eq!(artifact.size, 8);
    assert_eq!(artifact.checksum.len(), 64);

    assert_eq!(project.debs().len(), 1);

    let controls = files_with_name(&project.work(), |n| n == "control");
    assert_eq!(controls.len(), 1);
    let control = std::fs::read_to_string(&controls[0]).unwrap();
    assert!(control.contains("Package: helloworld\n"));
    assert!(control.contains("Version: 1.2.3-4"));
    assert!(control.contains("Architecture: amd64"));

    assert_eq!(runner.programs(), vec!["dotnet", "dpkg-deb"]);
}

#[tokio::test]
async fn publish_passes_runtime_configuration_output_and_expanded_arguments() {
    let project =
        Project::with("DotnetPublishArgs = -p:Version=${APP_VERSION} --self-contained true\n");
    let runner = Arc::new(FakeRunner::default());
    let bundler = deb_bundler(&project, runner.clone()).await;
    bundler.build().await.unwrap();

    let publish = runner.call("dotnet");
    assert_eq!(publish.args[0], "publish");
    assert!(publish.args[1].ends_with("HelloWorld.csproj"));
    assert_eq!(
        &publish.args[2..8],
        [
            "-r".to_string(),
            "linux-x64".to_string(),
            "-c".to_string(),
            "Release".to_string(),
            "-o".to_string(),
            bundler
                .temp_root()
                .join("build/opt/com.example.helloworld")
                .to_string_lossy()
                .into_owned(),
        ]
    );
    assert_eq!(&publish.args[8..], ["-p:Version=1.2.3", "--self-contained", "true"]);
    assert_eq!(publish.cwd.as_deref(), Some(project.dir.path()));
}

#[cfg(unix)]
#[tokio::test]
async fn post_publish_script_is_expanded_and_runs_from_the_scripts_directory() {
    let project = Project::with("DotnetPostPublish = post.sh\n");
    std::fs::write(
        project.dir.path().join("post.sh"),
        "echo ${APP_ID} ${APP_VERSION} > stamp\n",
    )
    .unwrap();
    let runner = Arc::new(FakeRunner::default());
    let bundler = deb_bundler(&project, runner.clone()).await;
    bundler.build().await.unwrap();

    assert_eq!(runner.programs(), vec!["dotnet", "/bin/sh", "dpkg-deb"]);
    let scripts = bundler.temp_root().join("scripts");
    let post = runner.call("/bin/sh");
    assert_eq!(post.cwd.as_deref(), Some(scripts.as_path()));
    assert_eq!(post.args, vec![scripts.join("post.sh").to_string_lossy().into_owned()]);
    assert_eq!(
        post.script.as_deref(),
        Some("echo com.example.helloworld 1.2.3 > stamp\n")
    );
}

#[cfg(unix)]
#[tokio::test]
async fn failing_post_publish_script_aborts_the_build() {
    let project = Project::with("DotnetPostPublish = post.sh\n");
    std::fs::write(project.dir.path().join("post.sh"), "exit 3\n").unwrap();
    let runner = Arc::new(FakeRunner::failing("/bin/sh"));
    let bundler = deb_bundler(&project, runner.clone()).await;

    let err = bundler.build().await.unwrap_err();
    assert!(matches!(err, Error::ExternalToolFailed { ref tool, .. } if tool == "/bin/sh"));
    assert_eq!(runner.programs(), vec!["dotnet", "/bin/sh"]);
    assert!(project.debs().is_empty());
}

#[tokio::test]
async fn packager_failure_leaves_no_artifact_and_keeps_the_work_tree() {
    let project = Project::new();
    let runner = Arc::new(FakeRunner::failing("dpkg-deb"));
    let bundler = deb_bundler(&project, runner.clone()).await;

    let err = bundler.build().await.unwrap_err();
    let Error::ExternalToolFailed { tool, code, .. } = &err else {
        panic!("expected tool failure, got {err}");
    };
    assert_eq!(tool, "dpkg-deb");
    assert_eq!(*code, Some(2));

    assert!(project.debs().is_empty());
    let root = bundler.temp_root();
    assert!(root.join("build/DEBIAN/control").is_file());
    assert!(root.join("build/opt/com.example.helloworld/HelloWorld").is_file());
}

#[tokio::test]
async fn debian_tree_has_desktop_entry_icon_and_launcher_target() {
    let project = Project::new();
    let bundler = deb_bundler(&project, Arc::new(FakeRunner::default())).await;
    bundler.build().await.unwrap();

    let build = bundler.temp_root().join("build");
    assert!(build.join("opt/com.example.helloworld/HelloWorld").is_file());
    assert!(
        build
            .join("usr/share/icons/hicolor/32x32/apps/com.example.helloworld.png")
            .is_file()
    );

    let desktop =
        std::fs::read_to_string(build.join("usr/share/applications/com.example.helloworld.desktop"))
            .unwrap();
    assert!(desktop.contains("Name=Hello World"));
    assert!(desktop.contains("/opt/com.example.helloworld/HelloWorld"));
    assert!(!desktop.contains("${"));
}

#[tokio::test]
async fn clean_build_removes_the_work_tree() {
    let project = Project::new();
    let interaction = Interaction::unattended();
    let config = parser::parse(&project.conf(), &interaction).await.unwrap();

    let mut options = BuildOptions::new(PackageType::Deb);
    options.temp_base = Some(project.work());
    options.clean = true;
    let bundler = Bundler::for_host(
        config,
        options,
        interaction,
        Arc::new(FakeRunner::default()),
        Host::new(OsFamily::Linux, Arch::X64),
    )
    .unwrap();

    bundler.build().await.unwrap();
    assert!(!bundler.temp_root().exists());
}

#[tokio::test]
async fn windows_format_is_refused_on_linux() {
    let project = Project::new();
    let interaction = Interaction::unattended();
    let config = parser::parse(&project.conf(), &interaction).await.unwrap();

    let err = Bundler::for_host(
        config,
        BuildOptions::new(PackageType::Msi),
        interaction,
        Arc::new(FakeRunner::default()),
        Host::new(OsFamily::Linux, Arch::X64),
    )
    .unwrap_err();
    assert!(matches!(err, Error::UnsupportedPlatform(_)));
}

#[tokio::test]
async fn invalid_configuration_reports_every_problem() {
    let dir = TempDir::new().unwrap();
    let conf = dir.path().join("bad.netloy");
    std::fs::write(
        &conf,
        "AppBaseName =\nAppId =\nAppVersionRelease = not a version\n",
    )
    .unwrap();

    let err = parser::parse(&conf, &Interaction::unattended())
        .await
        .unwrap_err();
    let Error::ValidationFailed(problems) = &err else {
        panic!("expected validation failure, got {err}");
    };
    assert!(problems.len() >= 3);
    assert!(err.to_string().lines().count() >= 4);
}
