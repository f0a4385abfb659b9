//! Linux package formats.
//!
//! | Format | Module | Tool |
//! |--------|--------|------|
//! | .deb | [`debian`] | `dpkg-deb` |
//! | .rpm | [`rpm`] | `rpmbuild` |
//! | .pkg.tar.zst | [`pacman`] | `makepkg` |
//! | .AppImage | [`appimage`] | `appimagetool` |
//! | .flatpak | [`flatpak`] | `flatpak-builder`, `flatpak` |
//!
//! The package formats (deb, rpm, pacman) install the published application
//! to `/opt/<AppId>` and share the `usr/` tree built by [`freedesktop`].

pub mod appimage;
pub mod debian;
pub mod flatpak;
pub mod freedesktop;
pub mod pacman;
pub mod rpm;

use crate::bundler::settings::Configuration;

/// Package name in the form distribution tools accept.
///
/// Used for the deb `Package`, the RPM `Name` and the pacman `pkgname`.
/// Derived from `PackageName` (or `AppBaseName`): lowercase; characters outside `[a-z0-9.+-]` become `-`.
pub fn package_id(config: &Configuration) -> String {
    config
        .package_name()
        .to_ascii_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// `/opt/<AppId>`, the install location of the package formats.
pub fn opt_dir(config: &Configuration) -> String {
    format!("/opt/{}", config.app_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_ids_are_lowercase_and_safe() {
        let mut conf = Configuration::default();
        assert_eq!(package_id(&conf), "helloworld");
        conf.package_name = "My_App 2".into();
        assert_eq!(package_id(&conf), "my-app-2");
    }
}
