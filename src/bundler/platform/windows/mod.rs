//! Windows installers.
//!
//! | Format | Module | Tool |
//! |--------|--------|------|
//! | .exe | [`inno`] | Inno Setup `iscc` |
//! | .msi | [`wix`] | WiX Toolset `wix build` |
//!
//! Both publish into `<root>/publish` and describe the installer in a
//! generated script. Signing is delegated to Inno Setup's `SignTool`
//! directive when `SetupSignTool` is set; netloy never signs itself.

pub mod inno;
pub mod wix;

use crate::bundler::{
    error::Result,
    settings::Configuration,
    utils::fs,
};
use std::path::Path;

/// Four-part numeric version as Windows version resources require.
///
/// Each component keeps its leading digits only; missing components are
/// zero and anything past the fourth is dropped.
pub fn numeric_version(version: &str) -> String {
    let mut parts: Vec<String> = version
        .split('.')
        .take(4)
        .map(|p| {
            let digits: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() { "0".to_string() } else { digits }
        })
        .collect();
    parts.resize(4, "0".to_string());
    parts.join(".")
}

/// Writes `content` with a UTF-8 byte order mark.
pub async fn write_utf8_bom(path: &Path, content: &str) -> Result<()> {
    let mut bytes = Vec::with_capacity(content.len() + 3);
    bytes.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
    bytes.extend_from_slice(content.replace("\r\n", "\n").replace('\n', "\r\n").as_bytes());
    fs::write_file(path, bytes).await
}

/// `<root>/publish`
pub(crate) fn publish_dir(root: &Path) -> std::path::PathBuf {
    root.join("publish")
}

/// First configured `.ico` file.
pub(crate) fn setup_icon(config: &Configuration) -> Option<&Path> {
    crate::bundler::resources::icons::first_of(
        &config.icons,
        crate::bundler::resources::icons::IconFormat::Ico,
    )
    .map(|i| i.path.as_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_pad_to_four_numeric_parts() {
        assert_eq!(numeric_version("1"), "1.0.0.0");
        assert_eq!(numeric_version("1.2.3"), "1.2.3.0");
        assert_eq!(numeric_version("1.2.3-beta.1"), "1.2.3.1");
        assert_eq!(numeric_version("2.0.0.7.9"), "2.0.0.7");
        assert_eq!(numeric_version("v3"), "0.0.0.0");
    }
}
