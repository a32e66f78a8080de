use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ChunkerError, Result};

/// Default lower bound of the packing band
pub const DEFAULT_TARGET_TOKENS_MIN: usize = 500;
/// Default upper bound of the packing band
pub const DEFAULT_TARGET_TOKENS_MAX: usize = 800;
/// Default trailing overlap carried between consecutive chunks
pub const DEFAULT_OVERLAP_TOKENS: usize = 100;
/// Characters per token assumed by the char-ratio estimator and the hard-wrap fallback
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// Configuration for section chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Minimum chunk size in tokens (soft target; undersized buffers absorb the next piece)
    pub target_tokens_min: usize,

    /// Maximum chunk size in tokens (emitted content is trimmed to this, except atomic blocks)
    pub target_tokens_max: usize,

    /// Token budget of the trailing pieces repeated at the start of the next chunk (0 = none)
    pub overlap_tokens: usize,

    /// Token counter backing every size decision
    pub tokenizer: TokenizerKind,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_tokens_min: DEFAULT_TARGET_TOKENS_MIN,
            target_tokens_max: DEFAULT_TARGET_TOKENS_MAX,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
            tokenizer: TokenizerKind::default(),
        }
    }
}

impl ChunkerConfig {
    /// Override the packing band and overlap
    #[must_use]
    pub fn with_limits(mut self, min: usize, max: usize, overlap: usize) -> Self {
        self.target_tokens_min = min;
        self.target_tokens_max = max;
        self.overlap_tokens = overlap;
        self
    }

    /// Override the token counter
    #[must_use]
    pub fn with_tokenizer(mut self, tokenizer: TokenizerKind) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Whether consecutive chunks share a trailing overlap
    #[must_use]
    pub const fn keeps_overlap(&self) -> bool {
        self.overlap_tokens > 0
    }

    /// Validate configuration
    ///
    /// `target_tokens_min > target_tokens_max` is accepted: the packer then never
    /// reaches the minimum and every overflowing piece is force-appended.
    pub fn validate(&self) -> Result<()> {
        if self.target_tokens_max == 0 {
            return Err(ChunkerError::invalid_config(
                "target_tokens_max must be > 0",
            ));
        }

        if let TokenizerKind::CharRatio { chars_per_token } = self.tokenizer {
            if chars_per_token == 0 {
                return Err(ChunkerError::invalid_config(
                    "chars_per_token must be > 0",
                ));
            }
        }

        Ok(())
    }
}

/// Token counter selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenizerKind {
    /// Fixed characters-per-token approximation, no model required
    CharRatio {
        #[serde(default = "default_chars_per_token")]
        chars_per_token: usize,
    },

    /// OpenAI `cl100k_base` byte-pair encoding
    Cl100k,

    /// HuggingFace `tokenizer.json` (requires the `hf-tokenizer` feature)
    HuggingFace { path: PathBuf },
}

impl Default for TokenizerKind {
    fn default() -> Self {
        Self::Cl100k
    }
}

impl TokenizerKind {
    /// Char-ratio estimator with the default ratio
    #[must_use]
    pub const fn char_ratio() -> Self {
        Self::CharRatio {
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }

    /// Short name for logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CharRatio { .. } => "char_ratio",
            Self::Cl100k => "cl100k",
            Self::HuggingFace { .. } => "hugging_face",
        }
    }
}

const fn default_chars_per_token() -> usize {
    DEFAULT_CHARS_PER_TOKEN
}
