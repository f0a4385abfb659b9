//! `${NAME}` substitution for templates, scripts and tool arguments.
//!
//! A [`MacroRegistry`] is owned by one build. It holds a resolved value for
//! each [`MacroId`] and mirrors the values into an environment map handed to
//! every child process (`${APP_VERSION}` becomes `APP_VERSION`). The process
//! environment of netloy itself is never modified.
//!
//! Values are expanded when stored, so they never contain known tokens and
//! expanding a string twice gives the same result as expanding it once.

use crate::bundler::{platform::OsFamily, resources::appstream::escape};
use regex::{Captures, Regex};
use std::{collections::BTreeMap, fmt, sync::LazyLock};

/// Bound on repeated substitution in [`MacroRegistry::expand`].
const MAX_EXPANSION_PASSES: usize = 8;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z0-9_]+)\}").expect("macro token regex is valid"));

macro_rules! macro_ids {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// The fixed set of substitution tokens.
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub enum MacroId {
            $(
                #[doc = concat!("`${", $name, "}`")]
                $variant,
            )+
        }

        impl MacroId {
            /// Every macro, in declaration order.
            pub const ALL: &'static [MacroId] = &[$(MacroId::$variant),+];

            /// Bare name, also used as the environment variable name.
            pub fn name(&self) -> &'static str {
                match self {
                    $(MacroId::$variant => $name,)+
                }
            }

            /// Looks up a macro by bare name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(MacroId::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

macro_ids! {
    LocalDirectory => "LOCAL_DIRECTORY",
    AppBaseName => "APP_BASE_NAME",
    AppFriendlyName => "APP_FRIENDLY_NAME",
    AppId => "APP_ID",
    AppShortSummary => "APP_SHORT_SUMMARY",
    AppLicenseId => "APP_LICENSE_ID",
    AppVersion => "APP_VERSION",
    PackageRelease => "PACKAGE_RELEASE",
    PublisherName => "PUBLISHER_NAME",
    PublisherId => "PUBLISHER_ID",
    PublisherCopyright => "PUBLISHER_COPYRIGHT",
    PublisherLinkName => "PUBLISHER_LINK_NAME",
    PublisherLinkUrl => "PUBLISHER_LINK_URL",
    PublisherEmail => "PUBLISHER_EMAIL",
    DesktopNoDisplay => "DESKTOP_NODISPLAY",
    DesktopTerminal => "DESKTOP_TERMINAL",
    PrimeCategory => "PRIME_CATEGORY",
    AppStreamDescriptionXml => "APPSTREAM_DESCRIPTION_XML",
    AppStreamChangelogXml => "APPSTREAM_CHANGELOG_XML",
    DotnetRuntime => "DOTNET_RUNTIME",
    BuildArch => "BUILD_ARCH",
    BuildTarget => "BUILD_TARGET",
    BuildDate => "BUILD_DATE",
    BuildYear => "BUILD_YEAR",
    BuildRoot => "BUILD_ROOT",
    PublishBin => "PUBLISH_BIN",
    InstallBin => "INSTALL_BIN",
    InstallExec => "INSTALL_EXEC",
}

impl MacroId {
    /// The token as written in text, e.g. `${APP_ID}`.
    pub fn token(&self) -> String {
        format!("${{{}}}", self.name())
    }

    /// Whether the value is already XML markup.
    pub fn is_markup(self) -> bool {
        matches!(self, MacroId::AppStreamDescriptionXml | MacroId::AppStreamChangelogXml)
    }
}

impl fmt::Display for MacroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}}}", self.name())
    }
}

/// Resolved macro values for one build.
#[derive(Debug, Clone)]
pub struct MacroRegistry {
    family: OsFamily,
    values: BTreeMap<MacroId, String>,
    env: BTreeMap<String, String>,
}

impl MacroRegistry {
    /// Empty registry whose category translation targets `family`.
    pub fn new(family: OsFamily) -> Self {
        Self {
            family,
            values: BTreeMap::new(),
            env: BTreeMap::new(),
        }
    }

    /// Target family used for category translation.
    pub fn family(&self) -> OsFamily {
        self.family
    }

    /// Stores `value`, expanding any tokens it contains first.
    ///
    /// An empty value removes the environment entry.
    pub fn set(&mut self, id: MacroId, value: impl AsRef<str>) {
        let resolved = self.expand(value.as_ref());
        if resolved.is_empty() {
            self.values.remove(&id);
            self.env.remove(id.name());
            return;
        }
        self.values.insert(id, resolved);
        let exported = self.get(id);
        self.env.insert(id.name().to_string(), exported);
    }

    /// Resolved value, or an empty string when unset.
    ///
    /// `PRIME_CATEGORY` is translated for the target family, so on Linux and
    /// macOS it yields the fallback category even when unset.
    pub fn get(&self, id: MacroId) -> String {
        let raw = self.values.get(&id).map(String::as_str).unwrap_or_default();
        match id {
            MacroId::PrimeCategory => translate_category(raw, self.family),
            _ => raw.to_string(),
        }
    }

    /// Replaces every known token in `text`.
    ///
    /// Known but unset tokens become empty strings; unknown `${...}` text is
    /// left as written. Substitution repeats until no known token is left, so
    /// a value ending in `$` followed by `{NAME}` in the text is expanded too
    /// and the result is stable under a second call.
    pub fn expand(&self, text: &str) -> String {
        self.expand_with(text, false)
    }

    /// Like [`expand`](Self::expand), for XML documents.
    ///
    /// Values are XML-escaped, except the `APPSTREAM_*_XML` macros which
    /// already hold markup.
    pub fn expand_xml(&self, text: &str) -> String {
        self.expand_with(text, true)
    }

    fn expand_with(&self, text: &str, xml: bool) -> String {
        let mut current = text.to_string();
        for _ in 0..MAX_EXPANSION_PASSES {
            if !current.contains("${") {
                break;
            }
            let next = TOKEN
                .replace_all(&current, |caps: &Captures<'_>| {
                    match MacroId::from_name(&caps[1]) {
                        Some(id) if xml && !id.is_markup() => escape(&self.get(id)),
                        Some(id) => self.get(id),
                        None => caps[0].to_string(),
                    }
                })
                .into_owned();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// Environment entries for child processes.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }
}

const LINUX_CATEGORIES: &[&str] = &[
    "AudioVideo",
    "Audio",
    "Video",
    "Development",
    "Education",
    "Game",
    "Graphics",
    "Network",
    "Office",
    "Science",
    "Settings",
    "System",
    "Utility",
];

const APPLE_CATEGORIES: &[&str] = &[
    "business",
    "developer-tools",
    "education",
    "entertainment",
    "finance",
    "games",
    "graphics-design",
    "healthcare-fitness",
    "lifestyle",
    "medical",
    "music",
    "news",
    "photography",
    "productivity",
    "reference",
    "social-networking",
    "sports",
    "travel",
    "utilities",
    "video",
    "weather",
];

/// Maps a category word to the form the target platform expects.
///
/// Linux gets a Freedesktop main category (fallback `Utility`), Apple gets
/// a `public.app-category.*` identifier (fallback `utilities`), Windows keeps
/// the word unchanged.
pub fn translate_category(word: &str, family: OsFamily) -> String {
    let word = word.trim();
    let lower = word.to_ascii_lowercase();
    match family {
        OsFamily::Windows => word.to_string(),
        OsFamily::Linux => LINUX_CATEGORIES
            .iter()
            .find(|c| c.eq_ignore_ascii_case(word))
            .unwrap_or(&"Utility")
            .to_string(),
        OsFamily::MacOs => {
            let suffix = match lower.as_str() {
                "audiovideo" | "video" => "video",
                "audio" => "music",
                "development" => "developer-tools",
                "game" => "games",
                "graphics" => "graphics-design",
                "network" => "social-networking",
                "office" => "productivity",
                "science" => "education",
                "settings" | "system" | "utility" => "utilities",
                other => APPLE_CATEGORIES
                    .iter()
                    .find(|c| **c == other)
                    .copied()
                    .unwrap_or("utilities"),
            };
            format!("public.app-category.{suffix}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn there_are_twenty_eight_macros() {
        assert_eq!(MacroId::ALL.len(), 28);
        for id in MacroId::ALL {
            assert_eq!(MacroId::from_name(id.name()), Some(*id));
        }
    }

    #[test]
    fn set_expands_and_mirrors_environment() {
        let mut macros = MacroRegistry::new(OsFamily::Linux);
        macros.set(MacroId::AppVersion, "1.2.3");
        macros.set(MacroId::PublisherCopyright, "(C) ${APP_VERSION}");
        assert_eq!(macros.get(MacroId::PublisherCopyright), "(C) 1.2.3");
        assert_eq!(macros.env().get("APP_VERSION").map(String::as_str), Some("1.2.3"));

        macros.set(MacroId::AppVersion, "");
        assert_eq!(macros.get(MacroId::AppVersion), "");
        assert!(!macros.env().contains_key("APP_VERSION"));
    }

    #[test]
    fn expand_is_idempotent_and_leaves_plain_text_alone() {
        let mut macros = MacroRegistry::new(OsFamily::Linux);
        macros.set(MacroId::AppId, "com.example.app");
        let text = "Exec=${APP_ID} ${UNKNOWN} ${BUILD_DATE} $HOME";
        let once = macros.expand(text);
        assert_eq!(once, "Exec=com.example.app ${UNKNOWN}  $HOME");
        assert_eq!(macros.expand(&once), once);
        assert_eq!(macros.expand("nothing to see"), "nothing to see");
    }

    #[test]
    fn value_ending_in_dollar_expands_completely() {
        let mut macros = MacroRegistry::new(OsFamily::Linux);
        macros.set(MacroId::PublisherName, "Cash$");
        macros.set(MacroId::AppId, "com.x.y");
        let once = macros.expand("${PUBLISHER_NAME}{APP_ID}");
        assert_eq!(once, "Cashcom.x.y");
        assert_eq!(macros.expand(&once), once);
    }

    #[test]
    fn xml_expansion_escapes_plain_values_only() {
        let mut macros = MacroRegistry::new(OsFamily::Linux);
        macros.set(MacroId::AppFriendlyName, "Tom & Jerry");
        macros.set(MacroId::AppStreamDescriptionXml, "<p>Chase</p>");
        assert_eq!(
            macros.expand_xml("<name>${APP_FRIENDLY_NAME}</name>${APPSTREAM_DESCRIPTION_XML}"),
            "<name>Tom &amp; Jerry</name><p>Chase</p>"
        );
        assert_eq!(macros.expand("${APP_FRIENDLY_NAME}"), "Tom & Jerry");
    }

    #[test]
    fn categories_translate_per_family() {
        assert_eq!(translate_category("development", OsFamily::Linux), "Development");
        assert_eq!(
            translate_category("development", OsFamily::MacOs),
            "public.app-category.developer-tools"
        );
        assert_eq!(translate_category("nonsense", OsFamily::Linux), "Utility");
        assert_eq!(
            translate_category("nonsense", OsFamily::MacOs),
            "public.app-category.utilities"
        );
        assert_eq!(translate_category("Finance", OsFamily::MacOs), "public.app-category.finance");
        assert_eq!(translate_category("Office", OsFamily::Windows), "Office");
    }

    #[test]
    fn prime_category_is_translated_on_get() {
        let mut macros = MacroRegistry::new(OsFamily::MacOs);
        macros.set(MacroId::PrimeCategory, "game");
        assert_eq!(macros.get(MacroId::PrimeCategory), "public.app-category.games");
        assert_eq!(
            macros.env().get("PRIME_CATEGORY").map(String::as_str),
            Some("public.app-category.games")
        );
    }
}
