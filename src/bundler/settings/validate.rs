//! Configuration validation and path normalization.

use super::{
    fields::{FieldKind, FIELDS},
    split_lines, Configuration, IconDescriptor, DEFAULT_MACOS_MIN_VERSION, NONE_VALUE,
};
use crate::bundler::{
    error::{ErrorExt, Result},
    interaction::Interaction,
};
use path_absolutize::Absolutize;
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

static REVERSE_DNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*(\.[A-Za-z0-9_-]+)+$").expect("static regex")
});

static VERSION_RELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(\.[0-9A-Za-z]+)*(-[0-9A-Za-z.-]+)?(\[[0-9A-Za-z.]+\])?$")
        .expect("static regex")
});

impl Configuration {
    /// Checks every rule and normalizes paths.
    ///
    /// Problems are appended to `problems` rather than returned one at a
    /// time. The returned error is reserved for failures that are not
    /// configuration mistakes, such as being unable to create the output
    /// directory.
    pub async fn validate(
        &mut self,
        interaction: &Interaction,
        problems: &mut Vec<String>,
    ) -> Result<()> {
        let base = self.local_directory();

        for field in FIELDS {
            let value = (field.get)(self);
            if field.required && value.trim().is_empty() {
                problems.push(format!("{} is required", field.name));
            }

            match field.kind {
                FieldKind::Path => {
                    let trimmed = value.trim();
                    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NONE_VALUE) {
                        continue;
                    }
                    let resolved = resolve(&base, trimmed);
                    if !resolved.exists() {
                        problems.push(format!(
                            "{}: file not found: {}",
                            field.name,
                            resolved.display()
                        ));
                    }
                    if let Err(problem) = (field.set)(self, &resolved.to_string_lossy()) {
                        problems.push(problem);
                    }
                }
                FieldKind::PathList => {
                    let mut resolved_all = Vec::new();
                    for entry in split_lines(&value) {
                        let resolved = resolve(&base, &entry);
                        if !resolved.is_file() {
                            problems.push(format!(
                                "{}: file not found: {}",
                                field.name,
                                resolved.display()
                            ));
                        }
                        resolved_all.push(resolved.to_string_lossy().into_owned());
                    }
                    if let Err(problem) = (field.set)(self, &resolved_all.join("\n")) {
                        problems.push(problem);
                    }
                }
                _ => {}
            }
        }

        self.validate_identity(problems);
        self.collect_icons(problems);
        self.validate_platform_options();
        self.prepare_output_directory(&base, interaction, problems)
            .await?;

        Ok(())
    }

    fn validate_identity(&self, problems: &mut Vec<String>) {
        let base_name = self.app_base_name.trim();
        if !base_name.is_empty()
            && base_name.contains(|c: char| c.is_whitespace() || c == '/' || c == '\\')
        {
            problems.push(format!(
                "AppBaseName '{base_name}' must not contain spaces or path separators"
            ));
        }

        for (name, value) in [("AppId", &self.app_id), ("PublisherId", &self.publisher_id)] {
            let value = value.trim();
            if !value.is_empty() && !REVERSE_DNS.is_match(value) {
                problems.push(format!(
                    "{name} '{value}' must be in reverse DNS form, e.g. com.example.app"
                ));
            }
        }

        let version = self.app_version_release.trim();
        if !version.is_empty() && !VERSION_RELEASE.is_match(version) {
            problems.push(format!(
                "AppVersionRelease '{version}' must be VERSION[RELEASE], e.g. 1.0.0[1]"
            ));
        }

        if self.package_name().contains(char::is_whitespace) {
            problems.push(format!("PackageName '{}' must not contain spaces", self.package_name()));
        }

        let url = self.publisher_link_url.trim();
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            problems.push(format!("PublisherLinkUrl '{url}' must start with http:// or https://"));
        }

        let code = self.msi_upgrade_code.trim();
        if !code.is_empty() && uuid::Uuid::parse_str(code.trim_matches(['{', '}'])).is_err() {
            problems.push(format!("MsiUpgradeCode '{code}' is not a GUID"));
        }
    }

    fn collect_icons(&mut self, problems: &mut Vec<String>) {
        self.icons.clear();
        for entry in split_lines(&self.icon_files) {
            match IconDescriptor::from_path(&entry) {
                Ok(icon) => {
                    if icon.path.is_file() {
                        icon.check_dimensions();
                    }
                    self.icons.push(icon);
                }
                Err(e) => problems.push(format!("IconFiles: {e}")),
            }
        }
    }

    fn validate_platform_options(&mut self) {
        let min = self.mac_os_min_version.trim();
        let numeric = !min.is_empty() && min.split('.').all(|p| p.parse::<u32>().is_ok());
        if !numeric {
            if !min.is_empty() {
                log::warn!(
                    "MacOsMinVersion '{min}' is not a number; using {DEFAULT_MACOS_MIN_VERSION}"
                );
            }
            self.mac_os_min_version = DEFAULT_MACOS_MIN_VERSION.to_string();
        }
    }

    async fn prepare_output_directory(
        &mut self,
        base: &Path,
        interaction: &Interaction,
        problems: &mut Vec<String>,
    ) -> Result<()> {
        let configured = self.output_directory.trim();
        let dir = if configured.is_empty() {
            base.to_path_buf()
        } else {
            resolve(base, configured)
        };
        self.output_directory = dir.to_string_lossy().into_owned();

        if dir.is_dir() {
            return Ok(());
        }

        if interaction.confirm(&format!("Create output directory {}?", dir.display())) {
            tokio::fs::create_dir_all(&dir)
                .await
                .fs_context("creating output directory", &dir)?;
        } else {
            problems.push(format!("OutputDirectory does not exist: {}", dir.display()));
        }
        Ok(())
    }
}

/// Expands `~` and resolves `value` against `base`.
fn resolve(base: &Path, value: &str) -> PathBuf {
    let expanded = match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map_or_else(|| PathBuf::from(value), |h| h.join(rest)),
        None => PathBuf::from(value),
    };
    match expanded.absolutize_from(base) {
        Ok(p) => p.into_owned(),
        Err(_) => base.join(expanded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::settings::parser::parse_text;

    const PREAMBLE: &str = "\
AppBaseName = HelloWorld
AppFriendlyName = Hello World
AppId = com.example.helloworld
AppVersionRelease = 1.0.0[1]
AppShortSummary = Says hello
AppLicenseId = MIT
PublisherName = Example Publisher
PublisherId = com.example
";

    async fn validate_text(dir: &Path, text: &str) -> (Configuration, Vec<String>) {
        let (mut conf, mut problems) = parse_text(&format!("{PREAMBLE}{text}"));
        conf.source_path = dir.join("app.netloy");
        conf.validate(&Interaction::unattended(), &mut problems)
            .await
            .unwrap();
        (conf, problems)
    }

    #[tokio::test]
    async fn missing_fields_and_bad_version_are_reported_together() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut conf, mut problems) =
            parse_text("AppFriendlyName = Hello\nAppVersionRelease = not.a.version\n");
        conf.source_path = tmp.path().join("app.netloy");
        conf.validate(&Interaction::unattended(), &mut problems)
            .await
            .unwrap();
        for key in [
            "AppBaseName",
            "AppId",
            "AppShortSummary",
            "AppLicenseId",
            "PublisherName",
            "PublisherId",
        ] {
            assert!(
                problems.iter().any(|p| p == &format!("{key} is required")),
                "{key}: {problems:?}"
            );
        }
        assert!(problems.iter().any(|p| p.starts_with("AppVersionRelease")));
        assert!(!problems.iter().any(|p| p.starts_with("AppFriendlyName")));
    }

    #[tokio::test]
    async fn complete_preamble_has_no_problems() {
        let tmp = tempfile::tempdir().unwrap();
        let (conf, problems) = validate_text(tmp.path(), "").await;
        assert!(problems.is_empty(), "{problems:?}");
        assert_eq!(conf.mac_os_min_version, DEFAULT_MACOS_MIN_VERSION);
    }

    #[tokio::test]
    async fn relative_paths_resolve_against_config_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("LICENSE"), "MIT").unwrap();
        let (conf, problems) = validate_text(tmp.path(), "AppLicenseFile = LICENSE\n").await;
        assert!(problems.is_empty(), "{problems:?}");
        assert_eq!(PathBuf::from(&conf.app_license_file), tmp.path().join("LICENSE"));
    }

    #[tokio::test]
    async fn missing_path_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let (_, problems) = validate_text(tmp.path(), "AppChangeFile = nope.txt\n").await;
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("AppChangeFile"));
    }

    #[tokio::test]
    async fn none_skips_template_path() {
        let tmp = tempfile::tempdir().unwrap();
        let (conf, problems) = validate_text(tmp.path(), "DesktopFile = NONE\n").await;
        assert!(problems.is_empty());
        assert_eq!(conf.desktop_file, "NONE");
    }

    #[tokio::test]
    async fn non_numeric_macos_version_gets_default() {
        let tmp = tempfile::tempdir().unwrap();
        let (conf, problems) = validate_text(tmp.path(), "MacOsMinVersion = catalina\n").await;
        assert!(problems.is_empty());
        assert_eq!(conf.mac_os_min_version, DEFAULT_MACOS_MIN_VERSION);
    }

    #[tokio::test]
    async fn declined_output_directory_is_a_problem() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut conf, mut problems) = parse_text("OutputDirectory = out/deep\n");
        conf.source_path = tmp.path().join("app.netloy");
        let refuse = Interaction::new(false, std::sync::Arc::new(|_| false));
        conf.validate(&refuse, &mut problems).await.unwrap();
        assert!(problems.iter().any(|p| p.starts_with("OutputDirectory")));
        assert!(!tmp.path().join("out/deep").exists());
    }

    #[tokio::test]
    async fn unattended_creates_output_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let (conf, problems) = validate_text(tmp.path(), "OutputDirectory = out\n").await;
        assert!(problems.is_empty());
        assert!(tmp.path().join("out").is_dir());
        assert_eq!(conf.output_directory(), tmp.path().join("out"));
    }

    #[tokio::test]
    async fn icons_are_collected_with_sizes() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("app.svg"), "<svg/>").unwrap();
        std::fs::write(tmp.path().join("app.48x48.png"), "not really a png").unwrap();
        let (conf, problems) =
            validate_text(tmp.path(), "IconFiles = app.svg; app.48x48.png\n").await;
        assert!(problems.is_empty(), "{problems:?}");
        assert_eq!(conf.icons.len(), 2);
        assert_eq!(conf.icons[1].bucket().as_deref(), Some("48x48"));
    }

    #[test]
    fn identifier_patterns() {
        assert!(REVERSE_DNS.is_match("com.example.app"));
        assert!(REVERSE_DNS.is_match("net.example"));
        assert!(!REVERSE_DNS.is_match("example"));
        assert!(!REVERSE_DNS.is_match("com..x"));
        assert!(VERSION_RELEASE.is_match("1.2.3[4]"));
        assert!(VERSION_RELEASE.is_match("1.2.3"));
        assert!(VERSION_RELEASE.is_match("2.0.0-beta.1[2]"));
        assert!(!VERSION_RELEASE.is_match("v1.0"));
        assert!(!VERSION_RELEASE.is_match("1.0[]"));
    }
}
