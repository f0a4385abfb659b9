//! Configuration model for a packaging run.
//!
//! A [`Configuration`] is read from a `.netloy` file by [`parser`], checked
//! by [`validate`](Configuration::validate), and then treated as read-only
//! for the rest of the build. The only mutation after parsing is path
//! normalization during validation.
//!
//! ```text
//! AppBaseName = HelloWorld
//! AppId = com.example.helloworld
//! AppVersionRelease = 1.0.0[1]
//! AppDescription = """
//!     First paragraph.
//!
//!     * a bullet
//! """
//! ```
//!
//! Every key is described once in the [`fields`] table, which drives parsing,
//! serialization, required-field checks and path normalization.

pub mod fields;
pub mod parser;
mod validate;
pub mod writer;

pub use crate::bundler::resources::icons::IconDescriptor;

use std::path::{Path, PathBuf};

/// Value that disables an optional desktop or metadata file.
pub const NONE_VALUE: &str = "NONE";

/// Fallback for `MacOsMinVersion` when the configured value is not numeric.
pub const DEFAULT_MACOS_MIN_VERSION: &str = "10.15";

/// All settings of one `.netloy` file.
///
/// Path-valued fields hold the text as written until validation, then the
/// absolute path. List-valued fields hold the raw text; use [`split_list`]
/// to read them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    /// File this configuration was read from. Empty for in-memory defaults.
    pub source_path: PathBuf,

    // App
    /// Base name of the published executable; also the default package name.
    pub app_base_name: String,
    /// Human readable application name.
    pub app_friendly_name: String,
    /// Reverse-DNS application identifier, e.g. `com.example.helloworld`.
    pub app_id: String,
    /// `VERSION[RELEASE]`, e.g. `1.0.0[1]`. Release defaults to `1`.
    pub app_version_release: String,
    /// One-line summary.
    pub app_short_summary: String,
    /// Long description. Paragraphs separated by blank lines; lines starting
    /// with `*` or `-` become list items in AppStream metadata.
    pub app_description: String,
    /// SPDX license identifier.
    pub app_license_id: String,
    /// Path to the license text.
    pub app_license_file: String,
    /// Path to the changelog.
    pub app_change_file: String,

    // Publisher
    /// Publisher display name.
    pub publisher_name: String,
    /// Reverse-DNS publisher identifier.
    pub publisher_id: String,
    /// Copyright line.
    pub publisher_copyright: String,
    /// Label for the publisher link.
    pub publisher_link_name: String,
    /// Publisher home page (http or https).
    pub publisher_link_url: String,
    /// Maintainer e-mail.
    pub publisher_email: String,

    // Desktop
    /// Command name installed on the `PATH` on Linux. Empty means none.
    pub start_command: String,
    /// Hide from application menus.
    ///
    /// Default: `false`
    pub desktop_no_display: bool,
    /// Run in a terminal.
    ///
    /// Default: `false`
    pub desktop_terminal: bool,
    /// Install desktop integration files.
    ///
    /// Default: `true`
    pub desktop_integrate: bool,
    /// Custom `.desktop` template, `NONE` to omit, empty for built-in.
    pub desktop_file: String,
    /// Single-word application category (e.g. `Development`).
    pub prime_category: String,
    /// Custom AppStream template, `NONE` to omit, empty for built-in.
    pub meta_file: String,
    /// Icon files, separated by newline or semicolon.
    pub icon_files: String,

    // Dotnet
    /// `.csproj` file or directory containing exactly one.
    pub dotnet_project_path: String,
    /// Extra arguments for `dotnet publish`. Macros are expanded.
    pub dotnet_publish_args: String,
    /// Script run after publish on non-Windows hosts.
    pub dotnet_post_publish: String,
    /// Script run after publish on Windows hosts.
    pub dotnet_post_publish_on_windows: String,

    // Output
    /// Package name; defaults to `AppBaseName`.
    pub package_name: String,
    /// Directory receiving the final artifact; defaults to the config directory.
    pub output_directory: String,

    // AppImage
    /// Extra arguments for `appimagetool`.
    pub app_image_args: String,
    /// Keep the version in the AppImage file name.
    ///
    /// Default: `false`
    pub app_image_version_output: bool,

    // Flatpak
    /// Flatpak runtime id.
    pub flatpak_platform_runtime: String,
    /// Flatpak SDK id.
    pub flatpak_platform_sdk: String,
    /// Flatpak runtime branch.
    pub flatpak_platform_version: String,
    /// `finish-args`, one per line.
    pub flatpak_finish_args: String,
    /// Extra arguments for `flatpak-builder`.
    pub flatpak_builder_args: String,

    // RPM
    /// Value of `AutoReq`.
    pub rpm_auto_req: bool,
    /// Value of `AutoProv`.
    ///
    /// Default: `true`
    pub rpm_auto_prov: bool,
    /// `Requires` entries.
    pub rpm_requires: String,

    // Debian
    /// Debian `Section`.
    pub debian_section: String,
    /// `Recommends` entries.
    pub debian_recommends: String,

    // Pacman
    /// `depends` entries.
    pub pacman_depends: String,

    // Windows setup
    /// Install for all users (requires elevation).
    pub setup_admin_install: bool,
    /// Title of an optional Start-menu command prompt shortcut.
    pub setup_command_prompt: String,
    /// Minimum Windows version, e.g. `10`.
    pub setup_min_windows_version: String,
    /// Sign tool command line passed to Inno Setup.
    pub setup_sign_tool: String,
    /// Suffix appended to setup file names.
    pub setup_suffix_output: String,
    /// Keep the version in setup file names.
    pub setup_version_output: bool,
    /// Start-menu group; defaults to `AppFriendlyName`.
    pub setup_group_name: String,
    /// Stable MSI upgrade code; derived from `AppId` when empty.
    pub msi_upgrade_code: String,

    // macOS
    /// Minimum macOS version.
    ///
    /// Default: `10.15`
    pub mac_os_min_version: String,
    /// Info.plist template merged over the generated one.
    pub mac_os_info_plist: String,
    /// Entitlements plist copied next to the bundle.
    pub mac_os_entitlements: String,

    /// Icons derived from [`icon_files`](Self::icon_files) at validation time.
    pub icons: Vec<IconDescriptor>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            source_path: PathBuf::new(),
            app_base_name: "HelloWorld".into(),
            app_friendly_name: "Hello World".into(),
            app_id: "com.example.helloworld".into(),
            app_version_release: "1.0.0[1]".into(),
            app_short_summary: "A HelloWorld application".into(),
            app_description: String::new(),
            app_license_id: "LicenseRef-Proprietary".into(),
            app_license_file: String::new(),
            app_change_file: String::new(),
            publisher_name: "Example Publisher".into(),
            publisher_id: "com.example".into(),
            publisher_copyright: "Copyright (C) Example Publisher ${BUILD_YEAR}".into(),
            publisher_link_name: "Home Page".into(),
            publisher_link_url: "https://example.com".into(),
            publisher_email: String::new(),
            start_command: String::new(),
            desktop_no_display: false,
            desktop_terminal: false,
            desktop_integrate: true,
            desktop_file: String::new(),
            prime_category: String::new(),
            meta_file: String::new(),
            icon_files: String::new(),
            dotnet_project_path: String::new(),
            dotnet_publish_args: "-p:Version=${APP_VERSION} --self-contained true -p:DebugType=None -p:DebugSymbols=false".into(),
            dotnet_post_publish: String::new(),
            dotnet_post_publish_on_windows: String::new(),
            package_name: String::new(),
            output_directory: "Deploy/OUT".into(),
            app_image_args: String::new(),
            app_image_version_output: false,
            flatpak_platform_runtime: "org.freedesktop.Platform".into(),
            flatpak_platform_sdk: "org.freedesktop.Sdk".into(),
            flatpak_platform_version: "23.08".into(),
            flatpak_finish_args: "--socket=wayland\n--socket=x11\n--filesystem=host\n--share=network".into(),
            flatpak_builder_args: String::new(),
            rpm_auto_req: false,
            rpm_auto_prov: true,
            rpm_requires: "krb5-libs\nlibicu\nopenssl-libs\nzlib".into(),
            debian_section: "misc".into(),
            debian_recommends: "libc6\nlibgcc-s1\nlibgssapi-krb5-2\nlibicu\nlibssl\nlibstdc++6\nlibunwind8\nzlib1g".into(),
            pacman_depends: String::new(),
            setup_admin_install: false,
            setup_command_prompt: String::new(),
            setup_min_windows_version: "10".into(),
            setup_sign_tool: String::new(),
            setup_suffix_output: String::new(),
            setup_version_output: false,
            setup_group_name: String::new(),
            msi_upgrade_code: String::new(),
            mac_os_min_version: DEFAULT_MACOS_MIN_VERSION.into(),
            mac_os_info_plist: String::new(),
            mac_os_entitlements: String::new(),
            icons: Vec::new(),
        }
    }
}

impl Configuration {
    /// Base that files are parsed into.
    ///
    /// Every text field is empty, so a key missing from a file reads as
    /// unset. Booleans hold their documented defaults. [`Default`] is the
    /// starter configuration written by `netloy new`.
    pub fn empty() -> Self {
        Self {
            source_path: PathBuf::new(),
            app_base_name: String::new(),
            app_friendly_name: String::new(),
            app_id: String::new(),
            app_version_release: String::new(),
            app_short_summary: String::new(),
            app_description: String::new(),
            app_license_id: String::new(),
            app_license_file: String::new(),
            app_change_file: String::new(),
            publisher_name: String::new(),
            publisher_id: String::new(),
            publisher_copyright: String::new(),
            publisher_link_name: String::new(),
            publisher_link_url: String::new(),
            publisher_email: String::new(),
            start_command: String::new(),
            desktop_no_display: false,
            desktop_terminal: false,
            desktop_integrate: true,
            desktop_file: String::new(),
            prime_category: String::new(),
            meta_file: String::new(),
            icon_files: String::new(),
            dotnet_project_path: String::new(),
            dotnet_publish_args: String::new(),
            dotnet_post_publish: String::new(),
            dotnet_post_publish_on_windows: String::new(),
            package_name: String::new(),
            output_directory: String::new(),
            app_image_args: String::new(),
            app_image_version_output: false,
            flatpak_platform_runtime: String::new(),
            flatpak_platform_sdk: String::new(),
            flatpak_platform_version: String::new(),
            flatpak_finish_args: String::new(),
            flatpak_builder_args: String::new(),
            rpm_auto_req: false,
            rpm_auto_prov: true,
            rpm_requires: String::new(),
            debian_section: String::new(),
            debian_recommends: String::new(),
            pacman_depends: String::new(),
            setup_admin_install: false,
            setup_command_prompt: String::new(),
            setup_min_windows_version: String::new(),
            setup_sign_tool: String::new(),
            setup_suffix_output: String::new(),
            setup_version_output: false,
            setup_group_name: String::new(),
            msi_upgrade_code: String::new(),
            mac_os_min_version: String::new(),
            mac_os_info_plist: String::new(),
            mac_os_entitlements: String::new(),
            icons: Vec::new(),
        }
    }

    /// Directory holding the configuration file.
    ///
    /// Relative paths in the file are resolved against it.
    pub fn local_directory(&self) -> PathBuf {
        match self.source_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// `PackageName`, or `AppBaseName` when unset.
    pub fn package_name(&self) -> &str {
        if self.package_name.trim().is_empty() {
            &self.app_base_name
        } else {
            &self.package_name
        }
    }

    /// `SetupGroupName`, or `AppFriendlyName` when unset.
    pub fn setup_group_name(&self) -> &str {
        if self.setup_group_name.trim().is_empty() {
            &self.app_friendly_name
        } else {
            &self.setup_group_name
        }
    }

    /// Output directory as a path.
    pub fn output_directory(&self) -> PathBuf {
        if self.output_directory.trim().is_empty() {
            self.local_directory()
        } else {
            PathBuf::from(&self.output_directory)
        }
    }

    /// An optional path field: `None` when empty or `NONE`.
    pub fn optional_path(value: &str) -> Option<&Path> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NONE_VALUE) {
            None
        } else {
            Some(Path::new(trimmed))
        }
    }

    /// Whether a template field was set to `NONE`.
    pub fn is_disabled(value: &str) -> bool {
        value.trim().eq_ignore_ascii_case(NONE_VALUE)
    }

    /// Command installed on the `PATH`, if it differs from the executable name.
    pub fn launcher_command(&self) -> Option<&str> {
        let cmd = self.start_command.trim();
        if cmd.is_empty() || cmd == self.app_base_name {
            None
        } else {
            Some(cmd)
        }
    }
}

/// Splits a dependency or list value on newline, comma and semicolon.
///
/// Entries are trimmed and empty entries dropped. There is no escaping.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(['\n', ',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits a value on newline and semicolon only.
///
/// Used for paths and command arguments, which may legitimately contain commas.
pub fn split_lines(value: &str) -> Vec<String> {
    value
        .split(['\n', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_lists_split_on_all_separators() {
        assert_eq!(
            split_list("libc6, libssl3;zlib1g\n\n  libicu  "),
            vec!["libc6", "libssl3", "zlib1g", "libicu"]
        );
        assert!(split_list("  ").is_empty());
    }

    #[test]
    fn package_name_falls_back_to_base_name() {
        let mut conf = Configuration::default();
        assert_eq!(conf.package_name(), "HelloWorld");
        conf.package_name = "hello-world".into();
        assert_eq!(conf.package_name(), "hello-world");
    }

    #[test]
    fn none_disables_optional_files() {
        assert!(Configuration::optional_path("NONE").is_none());
        assert!(Configuration::optional_path("none").is_none());
        assert!(Configuration::optional_path("").is_none());
        assert!(Configuration::is_disabled(" None "));
        assert_eq!(Configuration::optional_path("a.desktop"), Some(Path::new("a.desktop")));
    }

    #[test]
    fn launcher_skipped_when_same_as_executable() {
        let mut conf = Configuration::default();
        conf.start_command = "HelloWorld".into();
        assert_eq!(conf.launcher_command(), None);
        conf.start_command = "helloworld".into();
        assert_eq!(conf.launcher_command(), Some("helloworld"));
    }
}
