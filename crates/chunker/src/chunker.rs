use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::assembler::assemble;
use crate::blocks::split_blocks;
use crate::config::ChunkerConfig;
use crate::error::Result;
use crate::packer::pack_blocks;
use crate::token::{build_estimator, TokenEstimator};
use crate::types::{Chunk, Section};

/// Main chunker interface for processing sections
#[derive(Clone)]
pub struct Chunker {
    config: ChunkerConfig,
    estimator: Arc<dyn TokenEstimator>,
}

impl Chunker {
    /// Create a chunker, building the configured token estimator
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        let estimator = build_estimator(&config.tokenizer)?;
        Ok(Self { config, estimator })
    }

    /// Create a chunker around an existing estimator (`config.tokenizer` is ignored)
    pub fn with_estimator(config: ChunkerConfig, estimator: Arc<dyn TokenEstimator>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, estimator })
    }

    /// Chunk one section
    pub fn chunk_section(&self, section: &Section) -> Result<Vec<Chunk>> {
        let blocks = split_blocks(&section.text);
        let packed = pack_blocks(
            blocks.iter().map(String::as_str),
            self.estimator.as_ref(),
            &self.config,
        )?;
        log::debug!(
            "{}{}: {} blocks -> {} chunks",
            section.source,
            section.anchor.as_deref().unwrap_or(""),
            blocks.len(),
            packed.len()
        );
        Ok(assemble(section, packed))
    }

    /// Chunk sections in document order
    pub fn chunk_sections<'a>(
        &self,
        sections: impl IntoIterator<Item = &'a Section>,
    ) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for section in sections {
            chunks.extend(self.chunk_section(section)?);
        }
        Ok(chunks)
    }

    /// Chunk sections on the rayon pool.
    ///
    /// Output order is the same as [`chunk_sections`](Self::chunk_sections); on failure
    /// the error of the earliest failing section is returned.
    pub fn chunk_sections_parallel(&self, sections: &[Section]) -> Result<Vec<Chunk>> {
        let per_section: Vec<Result<Vec<Chunk>>> = sections
            .par_iter()
            .map(|section| self.chunk_section(section))
            .collect();

        let mut chunks = Vec::new();
        for result in per_section {
            chunks.extend(result?);
        }
        Ok(chunks)
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Token estimator shared by every section
    #[must_use]
    pub fn estimator(&self) -> &dyn TokenEstimator {
        self.estimator.as_ref()
    }

    /// Get statistics about chunking
    #[must_use]
    pub fn get_stats(chunks: &[Chunk]) -> ChunkingStats {
        let total_tokens: usize = chunks.iter().map(|c| c.tokens).sum();
        ChunkingStats {
            total_chunks: chunks.len(),
            total_tokens,
            avg_tokens_per_chunk: if chunks.is_empty() {
                0
            } else {
                total_tokens / chunks.len()
            },
            min_tokens: chunks.iter().map(|c| c.tokens).min().unwrap_or(0),
            max_tokens: chunks.iter().map(|c| c.tokens).max().unwrap_or(0),
        }
    }
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("config", &self.config)
            .field("estimator", &self.estimator.name())
            .finish()
    }
}

/// Statistics about chunking results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_tokens: usize,
    pub avg_tokens_per_chunk: usize,
    pub min_tokens: usize,
    pub max_tokens: usize,
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Tokens: {} | Avg: {} | Range: {}-{}",
            self.total_chunks,
            self.total_tokens,
            self.avg_tokens_per_chunk,
            self.min_tokens,
            self.max_tokens
        )
    }
}
