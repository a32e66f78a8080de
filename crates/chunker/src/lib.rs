//! # ragmd Chunker
//!
//! Structure-aware, token-bounded chunking of document sections for embedding and
//! retrieval.
//!
//! ## Philosophy
//!
//! The chunker creates retrieval units that:
//! - Never split a fenced code block or a pipe table
//! - Stay within a token budget, merging small paragraphs and splitting large ones
//! - Repeat a short trailing overlap so neighbouring chunks share context
//! - Carry their section's source, heading, anchor and front matter
//!
//! ## Architecture
//!
//! ```text
//! Section (from a loader)
//!     │
//!     ├──> Block Splitter → paragraphs, ``` fences, | tables
//!     │
//!     ├──> Sentence Splitter (oversized prose only)
//!     │    └─> hard character wrap for single huge sentences
//!     │
//!     ├──> Packer (min/max band, overlap carry-over)
//!     │    └─> Token Estimator trims to the max budget
//!     │
//!     └──> Assembler → Chunk { content, metadata }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use ragmd_chunker::{Chunker, ChunkerConfig, Section, TokenizerKind};
//!
//! let config = ChunkerConfig::default().with_tokenizer(TokenizerKind::char_ratio());
//! let chunker = Chunker::new(config).unwrap();
//!
//! let section = Section::new("docs/stock.md", "Stock levels are updated hourly.")
//!     .section("Section A")
//!     .meta("service", "stock");
//!
//! let chunks = chunker.chunk_section(&section).unwrap();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].get("service"), Some("stock"));
//! ```

mod assembler;
mod blocks;
mod chunker;
mod config;
mod error;
mod packer;
mod sentences;
mod token;
mod types;

pub use assembler::{assemble, section_metadata};
pub use blocks::{fence_marker, split_blocks, BlockKind};
pub use chunker::{Chunker, ChunkingStats};
pub use config::{
    ChunkerConfig, TokenizerKind, DEFAULT_CHARS_PER_TOKEN, DEFAULT_OVERLAP_TOKENS,
    DEFAULT_TARGET_TOKENS_MAX, DEFAULT_TARGET_TOKENS_MIN,
};
pub use error::{ChunkerError, Result};
pub use packer::{pack_blocks, PackedChunk, Packer};
pub use sentences::{hard_wrap, split_sentences, split_to_max_tokens};
#[cfg(feature = "hf-tokenizer")]
pub use token::HfTokenizerEstimator;
pub use token::{build_estimator, CharRatioEstimator, Cl100kEstimator, TokenEstimator};
pub use types::{Chunk, Metadata, Section, SECTION_KEYS};
