use crate::packer::PackedChunk;
use crate::types::{Chunk, Metadata, Section, SECTION_KEYS};

/// Metadata shared by every chunk of `section`.
///
/// The four section fields come first (absent ones as empty strings), then the
/// front-matter fields in their original order. Front-matter keys named like a
/// section field are skipped so the section value wins.
#[must_use]
pub fn section_metadata(section: &Section) -> Metadata {
    let mut metadata = Metadata::with_capacity(SECTION_KEYS.len() + section.meta.len());
    metadata.insert("source".to_string(), section.source.clone());
    metadata.insert(
        "title".to_string(),
        section.title.clone().unwrap_or_default(),
    );
    metadata.insert(
        "section".to_string(),
        section.section.clone().unwrap_or_default(),
    );
    metadata.insert(
        "anchor".to_string(),
        section.anchor.clone().unwrap_or_default(),
    );

    for (key, value) in &section.meta {
        if SECTION_KEYS.contains(&key.as_str()) {
            continue;
        }
        metadata.insert(key.clone(), value.clone());
    }
    metadata
}

/// Attach section metadata to packed contents, preserving emission order
#[must_use]
pub fn assemble(section: &Section, packed: Vec<PackedChunk>) -> Vec<Chunk> {
    let metadata = section_metadata(section);
    packed
        .into_iter()
        .map(|p| Chunk::new(p.content, metadata.clone(), p.tokens))
        .collect()
}
