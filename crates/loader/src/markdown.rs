use std::path::Path;

use chrono::{DateTime, Local};
use ragmd_chunker::{fence_marker, Metadata, Section};

use crate::error::Result;
use crate::front_matter::{parse_front_matter, split_front_matter};

/// Front-matter fields of one document, in document order
pub type FrontMatter = Metadata;

/// Deepest heading level that starts a new section
const MAX_SECTION_LEVEL: usize = 4;

const UPDATED_AT: &str = "updated_at";

/// Anchor for a heading: `#` + lowercase slug
#[must_use]
pub fn slugify(heading: &str) -> String {
    let lowered = heading.trim().to_lowercase().replace(' ', "-");
    let mut anchor = String::with_capacity(lowered.len() + 1);
    anchor.push('#');
    anchor.extend(
        lowered
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '#')),
    );
    anchor
}

/// Parse an ATX heading line, returning `(level, text)`.
///
/// Up to three leading spaces are allowed; the closing `#` sequence is stripped.
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let level = rest.len() - rest.trim_start_matches('#').len();
    if level == 0 || level > 6 {
        return None;
    }
    let after = &rest[level..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }

    let mut text = after.trim();
    let without_closing = text.trim_end_matches('#');
    if without_closing.is_empty() || without_closing.ends_with([' ', '\t']) {
        text = without_closing.trim_end();
    }
    Some((level, text))
}

struct SectionBuilder<'a> {
    source: &'a str,
    front_matter: &'a FrontMatter,
    updated_at: Option<&'a str>,
    sections: Vec<Section>,
    title: Option<String>,
    heading: Option<String>,
    buf: Vec<&'a str>,
}

impl SectionBuilder<'_> {
    fn flush(&mut self) {
        let text = self.buf.join("\n");
        self.buf.clear();
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let mut meta = self.front_matter.clone();
        if let Some(updated_at) = self.updated_at {
            meta.entry(UPDATED_AT.to_string())
                .or_insert_with(|| updated_at.to_string());
        }

        self.sections.push(Section {
            source: self.source.to_string(),
            title: self.title.clone(),
            section: self.heading.clone(),
            anchor: self.heading.as_deref().map(slugify),
            text: text.to_string(),
            meta,
        });
    }

    fn start_heading(&mut self, level: usize, text: &str) {
        self.flush();
        if level == 1 && self.title.is_none() {
            self.title = Some(text.to_string());
        }
        self.heading = Some(text.to_string());
    }
}

/// Split a markdown document into heading-scoped sections.
///
/// `source` is recorded verbatim on every section; `updated_at`, when given, is
/// added to each section's metadata unless front matter already defines it.
pub fn parse_markdown_str(
    source: &str,
    content: &str,
    updated_at: Option<&str>,
) -> Result<(Vec<Section>, FrontMatter)> {
    let (yaml, body) = split_front_matter(content);
    let front_matter = match yaml {
        Some(yaml) => parse_front_matter(yaml, source)?,
        None => FrontMatter::new(),
    };

    let mut builder = SectionBuilder {
        source,
        front_matter: &front_matter,
        updated_at,
        sections: Vec::new(),
        title: None,
        heading: None,
        buf: Vec::new(),
    };

    let mut fence: Option<&str> = None;
    for line in body.lines() {
        if let Some(marker) = fence {
            if line.trim() == marker {
                fence = None;
            }
            builder.buf.push(line);
            continue;
        }
        if let Some(marker) = fence_marker(line) {
            fence = Some(marker);
            builder.buf.push(line);
            continue;
        }
        match parse_heading(line) {
            Some((level, text)) if level <= MAX_SECTION_LEVEL => {
                builder.start_heading(level, text);
            }
            _ => builder.buf.push(line),
        }
    }
    builder.flush();

    let sections = builder.sections;
    log::debug!("{source}: {} sections", sections.len());
    Ok((sections, front_matter))
}

/// Read and section a markdown file, stamping sections with the file's mtime
pub fn parse_markdown_file(path: &Path) -> Result<(Vec<Section>, FrontMatter)> {
    let content = std::fs::read_to_string(path)?;
    let updated_at = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|mtime| DateTime::<Local>::from(mtime).to_rfc3339())
        .ok();
    parse_markdown_str(&source_name(path), &content, updated_at.as_deref())
}

/// Path rendered with forward slashes
pub(crate) fn source_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "---\nservice: stock\napi_version: v1\n---\n# Title\n\n## Section A\nText A\n\n```json\n{\"a\": 1}\n```\n\n| col | val |\n| --- | --- |\n| x | 1 |\n\n## Section B\nText B\n";

    fn headings(sections: &[Section]) -> Vec<Option<&str>> {
        sections.iter().map(|s| s.section.as_deref()).collect()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Section A"), "#section-a");
        assert_eq!(slugify("  Auth & Tokens (v2) "), "#auth--tokens-v2");
        assert_eq!(slugify("snake_case #1"), "#snake_case-#1");
        assert_eq!(slugify(""), "#");
    }

    #[test]
    fn test_parse_heading() {
        assert_eq!(parse_heading("# Title"), Some((1, "Title")));
        assert_eq!(parse_heading("   ### Deep ###"), Some((3, "Deep")));
        assert_eq!(parse_heading("## C# tips"), Some((2, "C# tips")));
        assert_eq!(parse_heading("#hashtag"), None);
        assert_eq!(parse_heading("    # indented code"), None);
        assert_eq!(parse_heading("####### seven"), None);
    }

    #[test]
    fn sections_follow_headings() {
        let (sections, front_matter) = parse_markdown_str("doc.md", DOC, None).unwrap();

        assert_eq!(headings(&sections), vec![Some("Section A"), Some("Section B")]);
        assert_eq!(front_matter["service"], "stock");
        assert_eq!(front_matter["api_version"], "v1");

        let a = &sections[0];
        assert_eq!(a.title.as_deref(), Some("Title"));
        assert_eq!(a.anchor.as_deref(), Some("#section-a"));
        assert_eq!(
            a.text,
            "Text A\n\n```json\n{\"a\": 1}\n```\n\n| col | val |\n| --- | --- |\n| x | 1 |"
        );
        assert_eq!(a.meta["service"], "stock");
        assert_eq!(sections[1].text, "Text B");
        assert_eq!(sections[1].title.as_deref(), Some("Title"));
    }

    #[test]
    fn preamble_has_no_heading() {
        let (sections, _) =
            parse_markdown_str("notes.md", "Intro line.\n\n# Doc\nBody.", None).unwrap();
        assert_eq!(headings(&sections), vec![None, Some("Doc")]);
        assert_eq!(sections[0].anchor, None);
        assert_eq!(sections[0].title, None);
        assert_eq!(sections[1].title.as_deref(), Some("Doc"));
    }

    #[test]
    fn hashes_inside_fences_are_not_headings() {
        let doc = "# Doc\n```bash\n# install\npip install x\n```\n~~~\n## still code\n~~~\nAfter.";
        let (sections, _) = parse_markdown_str("a.md", doc, None).unwrap();
        assert_eq!(sections.len(), 1);
        assert!(sections[0].text.contains("# install"));
        assert!(sections[0].text.contains("## still code"));
        assert!(sections[0].text.ends_with("After."));
    }

    #[test]
    fn fence_closes_only_on_its_own_marker() {
        let doc = "# Doc\n```\n# a\n````\n# still code\n```\n# Real\nText.";
        let (sections, _) = parse_markdown_str("a.md", doc, None).unwrap();
        assert_eq!(headings(&sections), vec![Some("Doc"), Some("Real")]);
        assert!(sections[0].text.ends_with("# still code\n```"));
    }

    #[test]
    fn deep_headings_stay_in_text_and_empty_sections_are_skipped() {
        let doc = "# A\n\n## Empty\n\n### Filled\n##### Minor\nText.";
        let (sections, _) = parse_markdown_str("a.md", doc, None).unwrap();
        assert_eq!(headings(&sections), vec![Some("Filled")]);
        assert_eq!(sections[0].text, "##### Minor\nText.");
    }

    #[test]
    fn updated_at_does_not_override_front_matter() {
        let stamped = "2026-01-02T03:04:05+00:00";
        let (sections, _) = parse_markdown_str("a.md", "# A\nText", Some(stamped)).unwrap();
        assert_eq!(sections[0].meta["updated_at"], stamped);

        let doc = "---\nupdated_at: 2020-01-01\n---\n# A\nText";
        let (sections, _) = parse_markdown_str("a.md", doc, Some(stamped)).unwrap();
        assert_eq!(sections[0].meta["updated_at"], "2020-01-01");
    }

    #[test]
    fn source_uses_forward_slashes() {
        assert_eq!(source_name(Path::new("docs/api/a.md")), "docs/api/a.md");
        assert_eq!(source_name(Path::new("docs\\api\\a.md")), "docs/api/a.md");
    }
}
