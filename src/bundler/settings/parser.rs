//! Reader for the `.netloy` file format.
//!
//! The format is line oriented:
//!
//! - `Key = Value`, keys compared without regard to ASCII case
//! - lines starting with `#` and blank lines are ignored
//! - a value of `"""` opens a multi-line value closed by a later `"""`;
//!   each interior line is trimmed and the lines are joined with `\n`
//! - a line without `=` is skipped with a warning
//! - unknown keys are ignored, repeated keys keep the last value
//!
//! Malformed values are not reported one at a time. They are collected with
//! every other validation problem into one [`Error::ValidationFailed`].

use super::{fields, Configuration};
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    interaction::Interaction,
};
use path_absolutize::Absolutize;
use std::path::Path;

const FENCE: &str = "\"\"\"";

/// Reads, parses and validates a configuration file.
///
/// Relative paths inside the file are resolved against the file's directory.
pub async fn parse(path: &Path, interaction: &Interaction) -> Result<Configuration> {
    let path = path
        .absolutize()
        .fs_context("resolving configuration path", path)?
        .into_owned();
    if !path.is_file() {
        return Err(Error::NotFound {
            what: "configuration file".into(),
            path,
        });
    }

    log::debug!("Reading configuration {}", path.display());
    let text = tokio::fs::read_to_string(&path)
        .await
        .fs_context("reading configuration file", &path)?;

    let (mut conf, mut problems) = parse_text(&text);
    conf.source_path = path;
    conf.validate(interaction, &mut problems).await?;

    if problems.is_empty() {
        Ok(conf)
    } else {
        Err(Error::ValidationFailed(problems))
    }
}

/// Parses configuration text without validating it.
///
/// Keys absent from the text stay as in [`Configuration::empty`], so a
/// missing required key is caught by validation. Also returns the problems
/// found while reading values (malformed booleans, an unterminated
/// multi-line value).
pub fn parse_text(text: &str) -> (Configuration, Vec<String>) {
    parse_text_onto(Configuration::empty(), text)
}

/// Parses configuration text over `base`.
///
/// Keys present in the text replace the values of `base`; the rest are kept.
pub fn parse_text_onto(base: Configuration, text: &str) -> (Configuration, Vec<String>) {
    let mut conf = base;
    let mut problems = Vec::new();
    let mut lines = text.lines().enumerate();

    while let Some((index, raw)) = lines.next() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            log::warn!("Ignoring line {} without '=': {}", index + 1, line);
            continue;
        };
        let key = key.trim();
        let mut value = value.trim().to_string();

        if let Some(rest) = value.strip_prefix(FENCE) {
            if let Some(inline) = rest.strip_suffix(FENCE) {
                value = inline.trim().to_string();
            } else {
                let mut collected: Vec<String> = Vec::new();
                if !rest.trim().is_empty() {
                    collected.push(rest.trim().to_string());
                }
                let mut closed = false;
                for (_, next) in lines.by_ref() {
                    let next = next.trim();
                    if let Some(last) = next.strip_suffix(FENCE) {
                        if !last.trim().is_empty() {
                            collected.push(last.trim().to_string());
                        }
                        closed = true;
                        break;
                    }
                    collected.push(next.to_string());
                }
                if !closed {
                    problems.push(format!(
                        "{key}: multi-line value starting on line {} is missing its closing {FENCE}",
                        index + 1
                    ));
                }
                value = collected.join("\n");
            }
        }

        match fields::find(key) {
            Some(field) => {
                if let Err(problem) = (field.set)(&mut conf, &value) {
                    problems.push(problem);
                }
            }
            None => log::debug!("Ignoring unknown key '{}' on line {}", key, index + 1),
        }
    }

    (conf, problems)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_insensitive_and_last_write_wins() {
        let (conf, problems) = parse_text(
            "# comment\n\nappbasename = First\nAPPBASENAME = Second\nAppFriendlyName=  Spaced Out  \n",
        );
        assert!(problems.is_empty());
        assert_eq!(conf.app_base_name, "Second");
        assert_eq!(conf.app_friendly_name, "Spaced Out");
    }

    #[test]
    fn multi_line_values_are_trimmed_and_joined() {
        let (conf, problems) = parse_text(
            "AppDescription = \"\"\"\n    First paragraph.\n\n    * item one\n   \"\"\"\nAppId = com.x.y\n",
        );
        assert!(problems.is_empty());
        assert_eq!(conf.app_description, "First paragraph.\n\n* item one");
        assert_eq!(conf.app_id, "com.x.y");
    }

    #[test]
    fn inline_fence_is_single_value() {
        let (conf, _) = parse_text("AppShortSummary = \"\"\" short \"\"\"\n");
        assert_eq!(conf.app_short_summary, "short");
    }

    #[test]
    fn unterminated_fence_is_reported() {
        let (_, problems) = parse_text("AppDescription = \"\"\"\nnever closed\n");
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("AppDescription"));
    }

    #[test]
    fn lines_without_equals_and_unknown_keys_are_skipped() {
        let (conf, problems) = parse_text("just some words\nNoSuchKey = 1\nAppId = com.a.b\n");
        assert!(problems.is_empty());
        assert_eq!(conf.app_id, "com.a.b");
    }

    #[test]
    fn value_may_contain_equals() {
        let (conf, _) = parse_text("DotnetPublishArgs = -p:Version=1.0 -p:A=B\n");
        assert_eq!(conf.dotnet_publish_args, "-p:Version=1.0 -p:A=B");
    }

    #[test]
    fn absent_keys_stay_unset() {
        let (conf, problems) = parse_text("AppVersionRelease = 2.0.0[3]\n");
        assert!(problems.is_empty());
        assert_eq!(conf.app_version_release, "2.0.0[3]");
        assert!(conf.app_base_name.is_empty());
        assert!(conf.app_id.is_empty());
        assert!(conf.publisher_id.is_empty());
        assert!(conf.app_license_id.is_empty());
        assert!(conf.desktop_integrate);
    }

    #[test]
    fn parsing_onto_a_base_keeps_its_values() {
        let (conf, _) = parse_text_onto(Configuration::default(), "AppId = com.a.b\n");
        assert_eq!(conf.app_id, "com.a.b");
        assert_eq!(conf.app_base_name, "HelloWorld");
    }

    #[test]
    fn malformed_boolean_is_collected() {
        let (_, problems) = parse_text("DesktopTerminal = maybe\nRpmAutoReq = 1\n");
        assert_eq!(problems.len(), 2);
    }
}
