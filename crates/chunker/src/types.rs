use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered string metadata (front-matter fields, chunk metadata)
pub type Metadata = IndexMap<String, String>;

/// Metadata keys copied from the owning section; never overridden by front matter
pub const SECTION_KEYS: [&str; 4] = ["source", "title", "section", "anchor"];

/// One logical unit of a source document, as produced by a loader
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    /// Stable identifier of the document (e.g. a file path)
    pub source: String,

    /// Top-level heading of the document
    pub title: Option<String>,

    /// Nearest heading at or above this text
    pub section: Option<String>,

    /// Normalized slug of `section`
    pub anchor: Option<String>,

    /// Raw content, may contain fences, pipe tables and blank lines
    pub text: String,

    /// Free-form document fields (front matter)
    #[serde(default)]
    pub meta: Metadata,
}

impl Section {
    /// Create a section with text only
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Builder: set title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder: set section heading
    #[must_use]
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Builder: set anchor
    #[must_use]
    pub fn anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Builder: add a front-matter field
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Whether the section has any non-blank text
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A token-bounded piece of a section, ready for embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk text
    pub content: String,

    /// Section fields followed by front-matter fields
    pub metadata: Metadata,

    /// Estimated tokens of `content`
    pub tokens: usize,
}

impl Chunk {
    #[must_use]
    pub const fn new(content: String, metadata: Metadata, tokens: usize) -> Self {
        Self {
            content,
            metadata,
            tokens,
        }
    }

    /// Metadata value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// `(content, metadata)` pair for indexing pipelines
    #[must_use]
    pub fn into_pair(self) -> (String, Metadata) {
        (self.content, self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_section_builder() {
        let section = Section::new("docs/api.md", "Body")
            .title("API")
            .section("Auth")
            .anchor("#auth")
            .meta("service", "stock");

        assert_eq!(section.source, "docs/api.md");
        assert_eq!(section.title.as_deref(), Some("API"));
        assert_eq!(section.section.as_deref(), Some("Auth"));
        assert_eq!(section.anchor.as_deref(), Some("#auth"));
        assert_eq!(section.meta.get("service").map(String::as_str), Some("stock"));
        assert!(!section.is_blank());
        assert!(Section::new("a.md", " \n ").is_blank());
    }

    #[test]
    fn test_chunk_accessors() {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), "a.md".to_string());
        let chunk = Chunk::new("text".to_string(), metadata.clone(), 1);

        assert_eq!(chunk.get("source"), Some("a.md"));
        assert_eq!(chunk.get("missing"), None);
        assert_eq!(chunk.into_pair(), ("text".to_string(), metadata));
    }

    #[test]
    fn chunk_serializes_metadata_in_order() {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), "a.md".to_string());
        metadata.insert("title".to_string(), String::new());
        metadata.insert("service".to_string(), "stock".to_string());
        let chunk = Chunk::new("text".to_string(), metadata, 1);

        let json = serde_json::to_string(&chunk).unwrap();
        assert_eq!(
            json,
            r#"{"content":"text","metadata":{"source":"a.md","title":"","service":"stock"},"tokens":1}"#
        );
    }
}
