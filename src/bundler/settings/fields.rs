//! Static description of every configuration key.
//!
//! Each [`Field`] carries the key as written in files, its section, a help
//! line for commented output, and plain function pointers to read and write
//! the corresponding [`Configuration`] member. The parser, the writer and
//! the validator all walk this one table.

use super::Configuration;

/// How a field's text is interpreted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// `true` or `false`.
    Bool,
    /// A single file or directory path.
    Path,
    /// Newline/semicolon separated paths.
    PathList,
    /// Newline/comma/semicolon separated values.
    List,
}

/// One configuration key.
pub struct Field {
    /// Key as written in configuration files.
    pub name: &'static str,
    /// Section heading used when writing files.
    pub section: &'static str,
    /// Interpretation of the value text.
    pub kind: FieldKind,
    /// Whether an empty value is a validation error.
    pub required: bool,
    /// Help text emitted in commented output.
    pub help: &'static str,
    /// Reads the value as text.
    pub get: fn(&Configuration) -> String,
    /// Stores text into the field. Fails only for malformed booleans.
    pub set: fn(&mut Configuration, &str) -> Result<(), String>,
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .finish()
    }
}

/// `None` for an empty value, which keeps the field's default.
fn parse_bool(name: &str, value: &str) -> Result<Option<bool>, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        "" => Ok(None),
        other => Err(format!("{name} must be true or false (found '{other}')")),
    }
}

macro_rules! field {
    ($section:literal, $name:literal, $member:ident, Bool, $req:literal, $help:literal) => {
        Field {
            name: $name,
            section: $section,
            kind: FieldKind::Bool,
            required: $req,
            help: $help,
            get: |c| c.$member.to_string(),
            set: |c, v| {
                if let Some(flag) = parse_bool($name, v)? {
                    c.$member = flag;
                }
                Ok(())
            },
        }
    };
    ($section:literal, $name:literal, $member:ident, $kind:ident, $req:literal, $help:literal) => {
        Field {
            name: $name,
            section: $section,
            kind: FieldKind::$kind,
            required: $req,
            help: $help,
            get: |c| c.$member.clone(),
            set: |c, v| {
                c.$member = v.to_string();
                Ok(())
            },
        }
    };
}

/// Every key, in file order.
pub static FIELDS: &[Field] = &[
    field!("APP PREAMBLE", "AppBaseName", app_base_name, Text, true,
        "Mandatory. The base name of the application's main executable, without any extension. No spaces."),
    field!("APP PREAMBLE", "AppFriendlyName", app_friendly_name, Text, true,
        "Mandatory. The application's friendly name shown in menus."),
    field!("APP PREAMBLE", "AppId", app_id, Text, true,
        "Mandatory. Application identifier in reverse DNS form, e.g. com.example.helloworld."),
    field!("APP PREAMBLE", "AppVersionRelease", app_version_release, Text, true,
        "Mandatory. Version and package release, e.g. 1.2.3[1]. The release defaults to 1."),
    field!("APP PREAMBLE", "AppShortSummary", app_short_summary, Text, true,
        "Mandatory. A one-line summary of the application."),
    field!("APP PREAMBLE", "AppDescription", app_description, Text, false,
        "Optional multi-line description. Separate paragraphs with a blank line; start list items with '*' or '-'."),
    field!("APP PREAMBLE", "AppLicenseId", app_license_id, Text, true,
        "Mandatory. SPDX license identifier, e.g. MIT or LicenseRef-Proprietary."),
    field!("APP PREAMBLE", "AppLicenseFile", app_license_file, Path, false,
        "Optional path to the license text, relative to this file."),
    field!("APP PREAMBLE", "AppChangeFile", app_change_file, Path, false,
        "Optional path to a changelog. Lines '+ VERSION;DATE' start a release, '- text' adds an item."),
    field!("PUBLISHER", "PublisherName", publisher_name, Text, true,
        "Mandatory. Publisher or maintainer name."),
    field!("PUBLISHER", "PublisherId", publisher_id, Text, true,
        "Mandatory. Publisher identifier in reverse DNS form."),
    field!("PUBLISHER", "PublisherCopyright", publisher_copyright, Text, false,
        "Optional copyright line. Macros such as ${BUILD_YEAR} are expanded."),
    field!("PUBLISHER", "PublisherLinkName", publisher_link_name, Text, false,
        "Optional label for the publisher link."),
    field!("PUBLISHER", "PublisherLinkUrl", publisher_link_url, Text, false,
        "Optional publisher web page; must start with http:// or https://."),
    field!("PUBLISHER", "PublisherEmail", publisher_email, Text, false,
        "Optional maintainer e-mail address."),
    field!("DESKTOP INTEGRATION", "StartCommand", start_command, Text, false,
        "Optional command name installed on the PATH on Linux when it differs from AppBaseName."),
    field!("DESKTOP INTEGRATION", "DesktopNoDisplay", desktop_no_display, Bool, false,
        "Hide the application from menus (true or false)."),
    field!("DESKTOP INTEGRATION", "DesktopTerminal", desktop_terminal, Bool, false,
        "Run the application in a terminal (true or false)."),
    field!("DESKTOP INTEGRATION", "DesktopIntegrate", desktop_integrate, Bool, false,
        "Install desktop and AppStream files (true or false)."),
    field!("DESKTOP INTEGRATION", "DesktopFile", desktop_file, Path, false,
        "Optional custom .desktop template. Leave empty for the built-in one, or NONE to omit."),
    field!("DESKTOP INTEGRATION", "PrimeCategory", prime_category, Text, false,
        "Optional category word, e.g. Development, Game, Graphics, Office, Utility."),
    field!("DESKTOP INTEGRATION", "MetaFile", meta_file, Path, false,
        "Optional custom AppStream template. Leave empty for the built-in one, or NONE to omit."),
    field!("DESKTOP INTEGRATION", "IconFiles", icon_files, PathList, false,
        "Icon files separated by ';' or newline: NAME.svg, NAME.WxH.png, NAME.ico, NAME.icns."),
    field!("DOTNET PUBLISH", "DotnetProjectPath", dotnet_project_path, Path, false,
        "Optional .csproj file or its directory. Empty searches the directory of this file."),
    field!("DOTNET PUBLISH", "DotnetPublishArgs", dotnet_publish_args, Text, false,
        "Extra arguments for 'dotnet publish'. Macros are expanded."),
    field!("DOTNET PUBLISH", "DotnetPostPublish", dotnet_post_publish, Path, false,
        "Optional script run after publish on Linux and macOS hosts."),
    field!("DOTNET PUBLISH", "DotnetPostPublishOnWindows", dotnet_post_publish_on_windows, Path, false,
        "Optional script run after publish on Windows hosts."),
    field!("PACKAGE OUTPUT", "PackageName", package_name, Text, false,
        "Optional package name. Defaults to AppBaseName. No spaces."),
    field!("PACKAGE OUTPUT", "OutputDirectory", output_directory, Text, false,
        "Directory receiving the final package, relative to this file."),
    field!("APPIMAGE OPTIONS", "AppImageArgs", app_image_args, Text, false,
        "Extra arguments for appimagetool."),
    field!("APPIMAGE OPTIONS", "AppImageVersionOutput", app_image_version_output, Bool, false,
        "Include the version in the AppImage file name (true or false)."),
    field!("FLATPAK OPTIONS", "FlatpakPlatformRuntime", flatpak_platform_runtime, Text, false,
        "Flatpak runtime, e.g. org.freedesktop.Platform."),
    field!("FLATPAK OPTIONS", "FlatpakPlatformSdk", flatpak_platform_sdk, Text, false,
        "Flatpak SDK, e.g. org.freedesktop.Sdk."),
    field!("FLATPAK OPTIONS", "FlatpakPlatformVersion", flatpak_platform_version, Text, false,
        "Flatpak runtime branch, e.g. 23.08."),
    field!("FLATPAK OPTIONS", "FlatpakFinishArgs", flatpak_finish_args, List, false,
        "Sandbox permissions, one per line."),
    field!("FLATPAK OPTIONS", "FlatpakBuilderArgs", flatpak_builder_args, Text, false,
        "Extra arguments for flatpak-builder."),
    field!("RPM OPTIONS", "RpmAutoReq", rpm_auto_req, Bool, false,
        "Let rpmbuild compute requirements (true or false)."),
    field!("RPM OPTIONS", "RpmAutoProv", rpm_auto_prov, Bool, false,
        "Let rpmbuild compute provides (true or false)."),
    field!("RPM OPTIONS", "RpmRequires", rpm_requires, List, false,
        "Package requirements separated by newline, comma or semicolon."),
    field!("DEBIAN OPTIONS", "DebianSection", debian_section, Text, false,
        "Debian archive section, e.g. misc, utils, devel."),
    field!("DEBIAN OPTIONS", "DebianRecommends", debian_recommends, List, false,
        "Recommended packages separated by newline, comma or semicolon."),
    field!("PACMAN OPTIONS", "PacmanDepends", pacman_depends, List, false,
        "Package dependencies separated by newline, comma or semicolon."),
    field!("WINDOWS SETUP OPTIONS", "SetupAdminInstall", setup_admin_install, Bool, false,
        "Install for all users with elevation (true or false)."),
    field!("WINDOWS SETUP OPTIONS", "SetupCommandPrompt", setup_command_prompt, Text, false,
        "Optional title of a Start menu command prompt shortcut."),
    field!("WINDOWS SETUP OPTIONS", "SetupMinWindowsVersion", setup_min_windows_version, Text, false,
        "Minimum Windows version, e.g. 10."),
    field!("WINDOWS SETUP OPTIONS", "SetupSignTool", setup_sign_tool, Text, false,
        "Optional sign tool command line passed to Inno Setup."),
    field!("WINDOWS SETUP OPTIONS", "SetupSuffixOutput", setup_suffix_output, Text, false,
        "Optional suffix appended to setup file names."),
    field!("WINDOWS SETUP OPTIONS", "SetupVersionOutput", setup_version_output, Bool, false,
        "Include the version in setup file names (true or false)."),
    field!("WINDOWS SETUP OPTIONS", "SetupGroupName", setup_group_name, Text, false,
        "Start menu group. Defaults to AppFriendlyName."),
    field!("WINDOWS SETUP OPTIONS", "MsiUpgradeCode", msi_upgrade_code, Text, false,
        "Optional MSI upgrade GUID. Derived from AppId when empty."),
    field!("MACOS OPTIONS", "MacOsMinVersion", mac_os_min_version, Text, false,
        "Minimum macOS version, e.g. 10.15."),
    field!("MACOS OPTIONS", "MacOsInfoPlist", mac_os_info_plist, Path, false,
        "Optional Info.plist whose keys override the generated ones."),
    field!("MACOS OPTIONS", "MacOsEntitlements", mac_os_entitlements, Path, false,
        "Optional entitlements plist."),
];

/// Finds a field by key, ignoring ASCII case.
pub fn find(name: &str) -> Option<&'static Field> {
    FIELDS.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(find("appbasename").map(|f| f.name), Some("AppBaseName"));
        assert_eq!(find("APPID").map(|f| f.name), Some("AppId"));
        assert!(find("Unknown").is_none());
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = FIELDS.iter().map(|f| f.name.to_ascii_lowercase()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), FIELDS.len());
    }

    #[test]
    fn bool_fields_reject_other_words() {
        let field = find("DesktopTerminal").unwrap();
        let mut conf = Configuration::default();
        assert!((field.set)(&mut conf, "TRUE").is_ok());
        assert!(conf.desktop_terminal);
        assert!((field.set)(&mut conf, "yes").is_err());
    }

    #[test]
    fn empty_bool_keeps_the_default() {
        let field = find("DesktopIntegrate").unwrap();
        let mut conf = Configuration::empty();
        assert!((field.set)(&mut conf, "  ").is_ok());
        assert!(conf.desktop_integrate);
        assert!((field.set)(&mut conf, "false").is_ok());
        assert!(!conf.desktop_integrate);
    }
}
