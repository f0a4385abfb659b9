//! macOS application bundles and disk images.
//!
//! | Format | Module | Tool |
//! |--------|--------|------|
//! | .app (zipped) | [`app`] | `ditto` |
//! | .dmg | [`dmg`] | `hdiutil` |
//!
//! Both formats stage the same bundle:
//!
//! ```text
//! <AppFriendlyName>.app/Contents/
//!   Info.plist
//!   MacOS/...                 published application
//!   Resources/<AppBaseName>.icns
//! ```
//!
//! Signing and notarization are not performed.

pub mod app;
pub mod dmg;

use crate::bundler::settings::Configuration;

/// `<AppFriendlyName>.app`
pub fn bundle_name(config: &Configuration) -> String {
    format!("{}.app", config.app_friendly_name.trim())
}

/// Install location of the binaries once dragged to `/Applications`.
pub fn install_bin(config: &Configuration) -> String {
    format!("/Applications/{}/Contents/MacOS", bundle_name(config))
}
