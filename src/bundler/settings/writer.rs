//! Writes a [`Configuration`] back to the `.netloy` format.
//!
//! Used to create a starter file and to upgrade an existing file to the
//! current key set. The output always parses back to the same field values.

use super::{
    fields::{FieldKind, FIELDS},
    parser, Configuration,
};
use crate::bundler::error::{Error, ErrorExt, Result};
use std::{fmt::Write as _, path::Path};

/// Renders the configuration.
///
/// With `comments` set, each section gets a banner and each key its help
/// text. Without it, only section banners and keys are written.
pub fn serialize(conf: &Configuration, comments: bool) -> String {
    let mut out = String::new();
    let mut section = "";

    for field in FIELDS {
        if field.section != section {
            if !section.is_empty() {
                out.push('\n');
            }
            section = field.section;
            let _ = writeln!(out, "########################################");
            let _ = writeln!(out, "# {section}");
            let _ = writeln!(out, "########################################");
            out.push('\n');
        }

        if comments {
            let _ = writeln!(out, "# {}", field.help);
            if field.kind == FieldKind::Bool {
                let _ = writeln!(out, "# Type: true or false");
            }
        }

        let value = (field.get)(conf);
        if value.contains('\n') {
            let _ = writeln!(out, "{} = \"\"\"", field.name);
            for line in value.lines() {
                let _ = writeln!(out, "    {line}");
            }
            let _ = writeln!(out, "\"\"\"");
        } else {
            let _ = writeln!(out, "{} = {}", field.name, value);
        }

        if comments {
            out.push('\n');
        }
    }

    out
}

/// Writes a default configuration to `path`.
///
/// Refuses to overwrite an existing file.
pub async fn create_default(path: &Path, comments: bool) -> Result<()> {
    if path.exists() {
        return Err(Error::GenericError(format!(
            "{} already exists; use upgrade to rewrite it",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating configuration directory", parent)?;
    }
    let text = serialize(&Configuration::default(), comments);
    tokio::fs::write(path, text)
        .await
        .fs_context("writing configuration file", path)?;
    log::info!("Created {}", path.display());
    Ok(())
}

/// Rewrites an existing file with the current key set.
///
/// Values are kept, unknown keys are dropped, missing keys get their
/// defaults. The original is saved as `<path>.old` first.
pub async fn upgrade(path: &Path, comments: bool) -> Result<()> {
    if !path.is_file() {
        return Err(Error::NotFound {
            what: "configuration file".into(),
            path: path.to_path_buf(),
        });
    }

    let text = tokio::fs::read_to_string(path)
        .await
        .fs_context("reading configuration file", path)?;
    let (conf, problems) = parser::parse_text_onto(Configuration::default(), &text);
    if !problems.is_empty() {
        return Err(Error::ValidationFailed(problems));
    }

    let mut backup = path.as_os_str().to_owned();
    backup.push(".old");
    tokio::fs::copy(path, &backup)
        .await
        .fs_context("backing up configuration file", path)?;

    tokio::fs::write(path, serialize(&conf, comments))
        .await
        .fs_context("writing configuration file", path)?;
    log::info!("Upgraded {} (backup saved as .old)", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_round_trips() {
        let conf = Configuration::default();
        for comments in [false, true] {
            let text = serialize(&conf, comments);
            let (back, problems) = parser::parse_text(&text);
            assert!(problems.is_empty(), "{problems:?}");
            assert_eq!(back, conf);
        }
    }

    #[test]
    fn every_default_value_comes_back_from_the_text() {
        let conf = Configuration::default();
        let empty = Configuration::empty();
        let (back, _) = parser::parse_text(&serialize(&conf, false));
        for field in FIELDS {
            let expected = (field.get)(&conf);
            if field.kind != FieldKind::Bool && !expected.is_empty() {
                assert_ne!((field.get)(&empty), expected, "{}", field.name);
            }
            assert_eq!((field.get)(&back), expected, "{}", field.name);
        }
    }

    #[tokio::test]
    async fn upgrade_fills_missing_keys_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("app.netloy");
        std::fs::write(&path, "AppBaseName = Tool\n").unwrap();

        upgrade(&path, false).await.unwrap();

        let (conf, _) = parser::parse_text(&std::fs::read_to_string(&path).unwrap());
        assert_eq!(conf.app_base_name, "Tool");
        assert_eq!(conf.app_id, "com.example.helloworld");
        assert!(path.with_extension("netloy.old").is_file());
    }

    #[test]
    fn every_field_with_a_default_is_written() {
        let conf = Configuration::default();
        let text = serialize(&conf, false);
        for field in FIELDS {
            assert!(text.contains(&format!("{} =", field.name)), "{}", field.name);
        }
        assert!(text.contains("DebianRecommends = \"\"\""));
    }

    #[test]
    fn edited_values_survive_round_trip() {
        let mut conf = Configuration::default();
        conf.app_description = "Para one.\n\n* bullet".into();
        conf.desktop_terminal = true;
        conf.rpm_requires = "a, b".into();
        let (back, _) = parser::parse_text(&serialize(&conf, true));
        assert_eq!(back, conf);
    }
}
