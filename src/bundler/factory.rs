//! Host and runtime checks that decide whether a format can be built.

use crate::bundler::{
    error::{Error, Result},
    platform::{Arch, OsFamily, PackageType, Runtime},
};

/// The machine netloy is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Host {
    /// Host OS family, `None` for anything other than Linux, Windows or macOS.
    pub os: Option<OsFamily>,
    /// Host architecture, `None` when it has no runtime identifier.
    pub arch: Option<Arch>,
}

impl Host {
    /// The current machine.
    pub fn current() -> Self {
        Self {
            os: OsFamily::current(),
            arch: Arch::current().ok(),
        }
    }

    /// A specific machine.
    pub fn new(os: OsFamily, arch: Arch) -> Self {
        Self {
            os: Some(os),
            arch: Some(arch),
        }
    }
}

/// Validates `package_type` against the host and picks the target runtime.
///
/// Formats tied to an OS must be built on that OS and for that OS. Without
/// an explicit runtime the host architecture is used.
pub fn select_runtime(
    package_type: PackageType,
    requested: Option<Runtime>,
    host: Host,
) -> Result<Runtime> {
    let required = package_type.host_os();

    if let Some(required) = required
        && host.os != Some(required)
    {
        let here = host.os.map_or_else(|| std::env::consts::OS.to_string(), |os| os.to_string());
        return Err(Error::UnsupportedPlatform(format!(
            "{package_type} packages can only be built on {required} (this host is {here})"
        )));
    }

    let runtime = match requested {
        Some(runtime) => runtime,
        None => {
            let os = required.or(host.os).ok_or_else(|| {
                Error::UnsupportedPlatform(format!(
                    "cannot choose a default runtime on {}; pass --runtime",
                    std::env::consts::OS
                ))
            })?;
            let arch = host.arch.ok_or_else(|| {
                Error::UnsupportedPlatform(format!(
                    "host architecture {} has no runtime identifier; pass --runtime",
                    std::env::consts::ARCH
                ))
            })?;
            Runtime { os, arch }
        }
    };

    if let Some(required) = required
        && runtime.os != required
    {
        return Err(Error::UnsupportedPlatform(format!(
            "{package_type} packages need a {required} runtime, not {runtime}"
        )));
    }

    if !runtime.is_supported() {
        let allowed: Vec<String> = runtime
            .os
            .supported_arches()
            .iter()
            .map(|a| format!("{}-{}", runtime.os.rid_prefix(), a.rid_suffix()))
            .collect();
        return Err(Error::UnsupportedPlatform(format!(
            "runtime {runtime} is not supported; use one of {}",
            allowed.join(", ")
        )));
    }

    log::debug!("Selected runtime {runtime} for {package_type}");
    Ok(runtime)
}
