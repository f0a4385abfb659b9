//! AppStream XML fragments built from the description and changelog.

use std::fmt::Write as _;

/// Escapes text for XML element content and attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn bullet(line: &str) -> Option<&str> {
    line.strip_prefix("* ")
        .or_else(|| line.strip_prefix("- "))
        .or_else(|| line.strip_prefix("+ "))
        .map(str::trim)
}

/// Turns `AppDescription` into `<p>` and `<ul>` elements.
///
/// Blank lines end a paragraph; consecutive `*`/`-`/`+` lines form one list.
/// An empty description falls back to the summary.
pub fn description_xml(description: &str, summary: &str) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut items: Vec<&str> = Vec::new();

    fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<String>) {
        if !paragraph.is_empty() {
            blocks.push(format!("<p>{}</p>", escape(&paragraph.join(" "))));
            paragraph.clear();
        }
    }
    fn flush_items(items: &mut Vec<&str>, blocks: &mut Vec<String>) {
        if !items.is_empty() {
            let mut ul = String::from("<ul>");
            for item in items.iter() {
                let _ = write!(ul, "<li>{}</li>", escape(item));
            }
            ul.push_str("</ul>");
            blocks.push(ul);
            items.clear();
        }
    }

    for line in description.lines().map(str::trim) {
        if line.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            flush_items(&mut items, &mut blocks);
        } else if let Some(item) = bullet(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            items.push(item);
        } else {
            flush_items(&mut items, &mut blocks);
            paragraph.push(line);
        }
    }
    flush_paragraph(&mut paragraph, &mut blocks);
    flush_items(&mut items, &mut blocks);

    if blocks.is_empty() {
        return format!("<p>{}</p>", escape(summary.trim()));
    }
    blocks.join("\n")
}

struct Release<'a> {
    version: &'a str,
    date: &'a str,
    items: Vec<&'a str>,
}

/// Turns a changelog into `<release>` elements.
///
/// A line `+ VERSION;DATE` starts a release and `-`/`*` lines add items to
/// it. Without any release header, a single release for `version` dated
/// `date` is produced.
pub fn changelog_xml(changelog: &str, version: &str, date: &str) -> String {
    let mut releases: Vec<Release<'_>> = Vec::new();

    for line in changelog.lines().map(str::trim) {
        if let Some(header) = line.strip_prefix('+') {
            let (v, d) = header.split_once(';').unwrap_or((header, ""));
            releases.push(Release {
                version: v.trim(),
                date: d.trim(),
                items: Vec::new(),
            });
        } else if let Some(item) = line
            .strip_prefix('-')
            .or_else(|| line.strip_prefix('*'))
            .map(str::trim)
            .filter(|i| !i.is_empty())
            && let Some(current) = releases.last_mut()
        {
            current.items.push(item);
        }
    }

    if releases.is_empty() {
        return format!(
            "<release version=\"{}\" date=\"{}\" />",
            escape(version),
            escape(date)
        );
    }

    let mut out = Vec::new();
    for release in releases {
        let date = if release.date.is_empty() { date } else { release.date };
        if release.items.is_empty() {
            out.push(format!(
                "<release version=\"{}\" date=\"{}\" />",
                escape(release.version),
                escape(date)
            ));
            continue;
        }
        let mut xml = format!(
            "<release version=\"{}\" date=\"{}\">\n      <description>\n        <ul>\n",
            escape(release.version),
            escape(date)
        );
        for item in release.items {
            let _ = writeln!(xml, "          <li>{}</li>", escape(item));
        }
        xml.push_str("        </ul>\n      </description>\n    </release>");
        out.push(xml);
    }
    out.join("\n    ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_and_lists() {
        let xml = description_xml("Line one\nline two.\n\n* a & b\n- c\nAfter.", "sum");
        assert_eq!(
            xml,
            "<p>Line one line two.</p>\n<ul><li>a &amp; b</li><li>c</li></ul>\n<p>After.</p>"
        );
    }

    #[test]
    fn empty_description_uses_summary() {
        assert_eq!(description_xml("  \n", "Short <summary>"), "<p>Short &lt;summary&gt;</p>");
    }

    #[test]
    fn changelog_releases() {
        let xml = changelog_xml(
            "+ 1.1.0;2026-02-01\n- Fixed things\n- Added <stuff>\n\n+ 1.0.0;2026-01-01\n",
            "1.1.0",
            "2026-03-03",
        );
        assert!(xml.contains("<release version=\"1.1.0\" date=\"2026-02-01\">"));
        assert!(xml.contains("<li>Added &lt;stuff&gt;</li>"));
        assert!(xml.contains("<release version=\"1.0.0\" date=\"2026-01-01\" />"));
    }

    #[test]
    fn changelog_without_headers_yields_current_release() {
        assert_eq!(
            changelog_xml("- orphan item", "2.0.0", "2026-10-19"),
            "<release version=\"2.0.0\" date=\"2026-10-19\" />"
        );
    }
}
