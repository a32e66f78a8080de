//! # ragmd Loader
//!
//! Turns markdown files into [`Section`](ragmd_chunker::Section)s for the chunker:
//! YAML front matter becomes per-section metadata, and ATX headings (levels 1-4)
//! outside fenced code start new sections.
//!
//! ```rust
//! use ragmd_loader::parse_markdown_str;
//!
//! let doc = "---\nservice: stock\n---\n# Title\n\n## Section A\nText A\n";
//! let (sections, front_matter) = parse_markdown_str("doc.md", doc, None).unwrap();
//!
//! assert_eq!(front_matter["service"], "stock");
//! assert_eq!(sections[0].section.as_deref(), Some("Section A"));
//! assert_eq!(sections[0].anchor.as_deref(), Some("#section-a"));
//! ```

mod discover;
mod error;
mod front_matter;
mod markdown;

pub use discover::{discover_markdown, load_document, load_folder, LoadedDocument};
pub use error::{LoaderError, Result};
pub use front_matter::{parse_front_matter, split_front_matter};
pub use markdown::{parse_markdown_file, parse_markdown_str, slugify, FrontMatter};
