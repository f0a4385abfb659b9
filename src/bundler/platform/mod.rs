//! Platform-specific bundling implementations.
//!
//! This module contains the format builders and the types that describe
//! which formats can be built where.
//!
//! # Supported Platforms
//!
//! | Host | Package Types | Module |
//! |------|--------------|---------|
//! | Linux | .deb, .rpm, .pkg.tar.zst, AppImage, Flatpak | [`linux`] |
//! | macOS | .app, .dmg | [`macos`] |
//! | Windows | .exe (Inno Setup), .msi (WiX) | [`windows`] |
//! | any | .tar.gz / .zip | [`portable`] |
//!
//! All builder modules compile on every host. Whether a format may run on
//! the current machine is decided at runtime by the builder factory, which
//! keeps staging logic testable everywhere.

pub mod linux;
pub mod macos;
pub mod portable;
pub mod windows;

use crate::bundler::error::{Error, Result};
use std::{fmt, str::FromStr};

/// Supported package types for bundling.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum PackageType {
    /// Inno Setup installer (.exe).
    Exe,

    /// WiX Windows Installer package (.msi).
    Msi,

    /// macOS application bundle, delivered zipped (.app.zip).
    MacOsBundle,

    /// macOS DMG disk image (.dmg).
    Dmg,

    /// Linux AppImage (.AppImage).
    AppImage,

    /// Debian package (.deb).
    Deb,

    /// RPM package (.rpm).
    Rpm,

    /// Arch Linux package (.pkg.tar.zst).
    Pacman,

    /// Flatpak single-file bundle (.flatpak).
    Flatpak,

    /// Plain archive of the publish output (.tar.gz or .zip).
    Portable,
}

impl PackageType {
    /// Every package type, in CLI help order.
    pub const ALL: [PackageType; 10] = [
        PackageType::Exe,
        PackageType::Msi,
        PackageType::MacOsBundle,
        PackageType::Dmg,
        PackageType::AppImage,
        PackageType::Deb,
        PackageType::Rpm,
        PackageType::Pacman,
        PackageType::Flatpak,
        PackageType::Portable,
    ];

    /// Returns the short name for this package type.
    ///
    /// This is the lowercase identifier used on the command line and in
    /// temporary directory names.
    pub fn short_name(&self) -> &'static str {
        match self {
            PackageType::Exe => "exe",
            PackageType::Msi => "msi",
            PackageType::MacOsBundle => "app",
            PackageType::Dmg => "dmg",
            PackageType::AppImage => "appimage",
            PackageType::Deb => "deb",
            PackageType::Rpm => "rpm",
            PackageType::Pacman => "pacman",
            PackageType::Flatpak => "flatpak",
            PackageType::Portable => "portable",
        }
    }

    /// Operating system the format's native tool runs on.
    ///
    /// `None` means any host can build it.
    pub fn host_os(&self) -> Option<OsFamily> {
        match self {
            PackageType::Exe | PackageType::Msi => Some(OsFamily::Windows),
            PackageType::MacOsBundle | PackageType::Dmg => Some(OsFamily::MacOs),
            PackageType::AppImage
            | PackageType::Deb
            | PackageType::Rpm
            | PackageType::Pacman
            | PackageType::Flatpak => Some(OsFamily::Linux),
            PackageType::Portable => None,
        }
    }

    /// Returns all package types buildable on the given host.
    pub fn all_for_host(host: OsFamily) -> Vec<PackageType> {
        Self::ALL
            .into_iter()
            .filter(|t| t.host_os().is_none_or(|os| os == host))
            .collect()
    }

    /// Returns all package types available on the current platform.
    pub fn all_for_current_platform() -> Vec<PackageType> {
        match OsFamily::current() {
            Some(os) => Self::all_for_host(os),
            None => vec![PackageType::Portable],
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

impl FromStr for PackageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let found = match lower.as_str() {
            "setup" => Some(PackageType::Exe),
            "zip" => Some(PackageType::Portable),
            other => Self::ALL.into_iter().find(|t| t.short_name() == other),
        };
        found.ok_or_else(|| {
            let known: Vec<_> = Self::ALL.iter().map(|t| t.short_name()).collect();
            Error::UnsupportedPlatform(format!(
                "unknown package kind '{s}' (expected one of: {})",
                known.join(", ")
            ))
        })
    }
}

/// Operating system family of a host or a runtime identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum OsFamily {
    /// Linux distributions.
    Linux,
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    MacOs,
}

impl OsFamily {
    /// The OS this process runs on, if it is one of the three families.
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "linux" => Some(OsFamily::Linux),
            "windows" => Some(OsFamily::Windows),
            "macos" => Some(OsFamily::MacOs),
            _ => None,
        }
    }

    /// Runtime identifier prefix (`linux`, `win`, `osx`).
    pub fn rid_prefix(&self) -> &'static str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::Windows => "win",
            OsFamily::MacOs => "osx",
        }
    }

    /// Architectures a runtime identifier may name on this OS.
    pub fn supported_arches(&self) -> &'static [Arch] {
        match self {
            OsFamily::Linux => &[Arch::X64, Arch::Arm64, Arch::Arm],
            OsFamily::Windows => &[Arch::X64, Arch::X86, Arch::Arm64],
            OsFamily::MacOs => &[Arch::X64, Arch::Arm64],
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OsFamily::Linux => "Linux",
            OsFamily::Windows => "Windows",
            OsFamily::MacOs => "macOS",
        })
    }
}

/// CPU architecture of a runtime identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Arch {
    /// x86_64.
    X64,
    /// 32-bit x86.
    X86,
    /// AArch64.
    Arm64,
    /// 32-bit ARM hard-float.
    Arm,
}

impl Arch {
    /// Architecture of the current process.
    pub fn current() -> Result<Self> {
        match std::env::consts::ARCH {
            "x86_64" => Ok(Arch::X64),
            "x86" => Ok(Arch::X86),
            "aarch64" => Ok(Arch::Arm64),
            "arm" => Ok(Arch::Arm),
            other => Err(Error::UnsupportedPlatform(format!(
                "host architecture {other} has no runtime identifier"
            ))),
        }
    }

    /// Runtime identifier suffix (`x64`, `x86`, `arm64`, `arm`).
    pub fn rid_suffix(&self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::X86 => "x86",
            Arch::Arm64 => "arm64",
            Arch::Arm => "arm",
        }
    }

    /// Debian `Architecture` value.
    pub fn debian(&self) -> &'static str {
        match self {
            Arch::X64 => "amd64",
            Arch::X86 => "i386",
            Arch::Arm64 => "arm64",
            Arch::Arm => "armhf",
        }
    }

    /// RPM `BuildArch` value.
    pub fn rpm(&self) -> &'static str {
        match self {
            Arch::X64 => "x86_64",
            Arch::X86 => "i686",
            Arch::Arm64 => "aarch64",
            Arch::Arm => "armv7hl",
        }
    }

    /// Pacman `arch` value.
    pub fn pacman(&self) -> &'static str {
        match self {
            Arch::X64 => "x86_64",
            Arch::X86 => "i686",
            Arch::Arm64 => "aarch64",
            Arch::Arm => "armv7h",
        }
    }

    /// `ARCH` value understood by appimagetool.
    pub fn appimage(&self) -> &'static str {
        match self {
            Arch::X64 => "x86_64",
            Arch::X86 => "i686",
            Arch::Arm64 => "aarch64",
            Arch::Arm => "armhf",
        }
    }

    /// Flatpak `--arch` value.
    pub fn flatpak(&self) -> &'static str {
        match self {
            Arch::X64 => "x86_64",
            Arch::X86 => "i386",
            Arch::Arm64 => "aarch64",
            Arch::Arm => "arm",
        }
    }

    /// Inno Setup / WiX platform value.
    pub fn windows(&self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::X86 => "x86",
            Arch::Arm64 => "arm64",
            Arch::Arm => "arm",
        }
    }

    /// macOS `LSArchitecturePriority` value.
    pub fn macos(&self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            _ => "x86_64",
        }
    }
}

/// A .NET runtime identifier such as `linux-x64` or `win-arm64`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Runtime {
    /// Target operating system.
    pub os: OsFamily,
    /// Target architecture.
    pub arch: Arch,
}

impl Runtime {
    /// Runtime for the host machine.
    pub fn host() -> Result<Self> {
        let os = OsFamily::current().ok_or_else(|| {
            Error::UnsupportedPlatform(format!(
                "host OS {} has no runtime identifier",
                std::env::consts::OS
            ))
        })?;
        Ok(Self {
            os,
            arch: Arch::current()?,
        })
    }

    /// Whether the arch is in the closed set for the OS.
    pub fn is_supported(&self) -> bool {
        self.os.supported_arches().contains(&self.arch)
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.rid_prefix(), self.arch.rid_suffix())
    }
}

impl FromStr for Runtime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let unsupported = || Error::UnsupportedPlatform(format!("unknown runtime identifier '{s}'"));
        let (os, arch) = lower.split_once('-').ok_or_else(unsupported)?;
        let os = match os {
            "linux" => OsFamily::Linux,
            "win" => OsFamily::Windows,
            "osx" => OsFamily::MacOs,
            _ => return Err(unsupported()),
        };
        let arch = match arch {
            "x64" => Arch::X64,
            "x86" => Arch::X86,
            "arm64" => Arch::Arm64,
            "arm" => Arch::Arm,
            _ => return Err(unsupported()),
        };
        Ok(Self { os, arch })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_type_short_names_round_trip() {
        for t in PackageType::ALL {
            assert_eq!(t.short_name().parse::<PackageType>().unwrap(), t);
        }
        assert_eq!("Setup".parse::<PackageType>().unwrap(), PackageType::Exe);
        assert!("snap".parse::<PackageType>().is_err());
    }

    #[test]
    fn runtime_parses_and_displays() {
        let rid: Runtime = "linux-arm64".parse().unwrap();
        assert_eq!(rid.os, OsFamily::Linux);
        assert_eq!(rid.arch, Arch::Arm64);
        assert_eq!(rid.to_string(), "linux-arm64");
        assert!("freebsd-x64".parse::<Runtime>().is_err());
        assert!("linux".parse::<Runtime>().is_err());
    }

    #[test]
    fn arch_sets_are_closed_per_os() {
        assert!("linux-arm".parse::<Runtime>().unwrap().is_supported());
        assert!(!"linux-x86".parse::<Runtime>().unwrap().is_supported());
        assert!(!"osx-x86".parse::<Runtime>().unwrap().is_supported());
        assert!("win-x86".parse::<Runtime>().unwrap().is_supported());
    }

    #[test]
    fn host_formats() {
        let linux = PackageType::all_for_host(OsFamily::Linux);
        assert!(linux.contains(&PackageType::Deb));
        assert!(linux.contains(&PackageType::Portable));
        assert!(!linux.contains(&PackageType::Msi));
        let mac = PackageType::all_for_host(OsFamily::MacOs);
        assert_eq!(mac, vec![PackageType::MacOsBundle, PackageType::Dmg, PackageType::Portable]);
    }
}
