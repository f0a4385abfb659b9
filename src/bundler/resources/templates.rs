//! Built-in templates and the handlebars renderer used by manifest writers.
//!
//! The desktop entry and AppStream templates are plain text with `${NAME}`
//! macros, so user-supplied replacements use the same syntax. Manifests
//! (spec files, PKGBUILD, installer scripts) are handlebars templates
//! rendered from a JSON context.

use crate::bundler::error::{Error, Result};
use handlebars::Handlebars;
use serde::Serialize;

/// Default `.desktop` entry.
pub const DESKTOP_TEMPLATE: &str = r#"[Desktop Entry]
Type=Application
Name=${APP_FRIENDLY_NAME}
Icon=${APP_ID}
Comment=${APP_SHORT_SUMMARY}
Exec=${INSTALL_EXEC}
TryExec=${INSTALL_EXEC}
NoDisplay=${DESKTOP_NODISPLAY}
X-AppImage-Version=${APP_VERSION}
Terminal=${DESKTOP_TERMINAL}
Categories=${PRIME_CATEGORY};
"#;

/// Default AppStream metainfo.
///
/// Expanded with [`MacroRegistry::expand_xml`](crate::bundler::MacroRegistry::expand_xml),
/// so plain values are XML-escaped.
pub const METAINFO_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<component type="desktop-application">
  <id>${APP_ID}</id>
  <metadata_license>MIT</metadata_license>
  <project_license>${APP_LICENSE_ID}</project_license>
  <content_rating type="oars-1.1" />

  <name>${APP_FRIENDLY_NAME}</name>
  <summary>${APP_SHORT_SUMMARY}</summary>
  <developer id="${PUBLISHER_ID}">
    <name>${PUBLISHER_NAME}</name>
  </developer>
  <url type="homepage">${PUBLISHER_LINK_URL}</url>
  <launchable type="desktop-id">${APP_ID}.desktop</launchable>

  <description>
    ${APPSTREAM_DESCRIPTION_XML}
  </description>

  <categories>
    <category>${PRIME_CATEGORY}</category>
  </categories>

  <provides>
    <binary>${APP_BASE_NAME}</binary>
  </provides>

  <releases>
    ${APPSTREAM_CHANGELOG_XML}
  </releases>
</component>
"#;

/// Renders a handlebars template without HTML escaping.
pub fn render<T: Serialize>(name: &str, template: &str, data: &T) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string(name, template)
        .map_err(|e| Error::GenericError(format!("failed to register {name} template: {e}")))?;

    handlebars
        .render(name, data)
        .map_err(|e| Error::GenericError(format!("failed to render {name} template: {e}")))
}

/// Converts line endings to LF.
pub fn to_lf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_does_not_escape() {
        let out = render("t", "Name: {{name}}", &json!({ "name": "A & B <x>" })).unwrap();
        assert_eq!(out, "Name: A & B <x>");
    }

    #[test]
    fn missing_key_is_an_error_in_strict_mode() {
        assert!(render("t", "{{nope}}", &json!({})).is_err());
    }

    #[test]
    fn crlf_is_normalized() {
        assert_eq!(to_lf("a\r\nb\rc\n"), "a\nb\nc\n");
    }
}
