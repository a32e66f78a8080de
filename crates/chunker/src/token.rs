//! Approximate token counting.
//!
//! Every size decision in the packer and the hard-wrap width in the sentence
//! splitter go through one [`TokenEstimator`], so the counter only has to be
//! consistent with itself, not with any particular model.

use std::sync::Arc;

use tiktoken_rs::CoreBPE;

use crate::config::{TokenizerKind, DEFAULT_CHARS_PER_TOKEN};
use crate::error::{ChunkerError, Result};

/// Counts tokens and trims text to a token budget.
///
/// Implementations must be deterministic and free of side effects. They are shared
/// read-only across worker threads when sections are chunked in parallel.
pub trait TokenEstimator: Send + Sync {
    /// Approximate number of tokens in `text`
    fn count(&self, text: &str) -> Result<usize>;

    /// A prefix rendering of `text` whose [`count`](Self::count) is at most `max_tokens`.
    ///
    /// Text already within budget is returned unchanged, which makes trimming idempotent.
    fn trim_to_budget(&self, text: &str, max_tokens: usize) -> Result<String>;

    /// Characters per token used to size hard-wrapped slices
    fn chars_per_token(&self) -> usize {
        DEFAULT_CHARS_PER_TOKEN
    }

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Build the estimator selected in configuration.
///
/// Loading a BPE table or a tokenizer file is the expensive part; build once and
/// share the returned handle.
pub fn build_estimator(kind: &TokenizerKind) -> Result<Arc<dyn TokenEstimator>> {
    match kind {
        TokenizerKind::CharRatio { chars_per_token } => {
            Ok(Arc::new(CharRatioEstimator::new(*chars_per_token)?))
        }
        TokenizerKind::Cl100k => Ok(Arc::new(Cl100kEstimator::new()?)),
        #[cfg(feature = "hf-tokenizer")]
        TokenizerKind::HuggingFace { path } => Ok(Arc::new(HfTokenizerEstimator::from_file(path)?)),
        #[cfg(not(feature = "hf-tokenizer"))]
        TokenizerKind::HuggingFace { path } => Err(ChunkerError::invalid_config(format!(
            "tokenizer {} requires the `hf-tokenizer` feature",
            path.display()
        ))),
    }
}

/// Fixed characters-per-token approximation
#[derive(Debug, Clone, Copy)]
pub struct CharRatioEstimator {
    chars_per_token: usize,
}

impl CharRatioEstimator {
    pub fn new(chars_per_token: usize) -> Result<Self> {
        if chars_per_token == 0 {
            return Err(ChunkerError::invalid_config("chars_per_token must be > 0"));
        }
        Ok(Self { chars_per_token })
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self {
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn count(&self, text: &str) -> Result<usize> {
        Ok(text.chars().count().div_ceil(self.chars_per_token))
    }

    fn trim_to_budget(&self, text: &str, max_tokens: usize) -> Result<String> {
        let max_chars = max_tokens.saturating_mul(self.chars_per_token);
        let cut = text
            .char_indices()
            .nth(max_chars)
            .map_or(text.len(), |(idx, _)| idx);
        Ok(text[..cut].to_string())
    }

    fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }

    fn name(&self) -> &'static str {
        "char_ratio"
    }
}

/// `cl100k_base` byte-pair encoding
pub struct Cl100kEstimator {
    bpe: CoreBPE,
}

impl Cl100kEstimator {
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| ChunkerError::tokenizer(format!("failed to load cl100k_base: {e}")))?;
        Ok(Self { bpe })
    }
}

impl TokenEstimator for Cl100kEstimator {
    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.bpe.encode_ordinary(text).len())
    }

    fn trim_to_budget(&self, text: &str, max_tokens: usize) -> Result<String> {
        let ids = self.bpe.encode_ordinary(text);
        if ids.len() <= max_tokens {
            return Ok(text.to_string());
        }

        // A token prefix may end inside a multi-byte character, and re-encoding a
        // decoded prefix is not guaranteed to stay within budget. Back off until both hold.
        let mut keep = max_tokens;
        while keep > 0 {
            if let Ok(prefix) = self.bpe.decode(ids[..keep].to_vec()) {
                if self.count(&prefix)? <= max_tokens {
                    return Ok(prefix);
                }
            }
            keep -= 1;
        }
        Ok(String::new())
    }

    fn name(&self) -> &'static str {
        "cl100k"
    }
}

/// HuggingFace `tokenizer.json`
#[cfg(feature = "hf-tokenizer")]
pub struct HfTokenizerEstimator {
    tokenizer: tokenizers::Tokenizer,
}

#[cfg(feature = "hf-tokenizer")]
impl HfTokenizerEstimator {
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ChunkerError::invalid_config(format!(
                "tokenizer file {} does not exist",
                path.display()
            )));
        }
        let tokenizer = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            ChunkerError::tokenizer(format!("Tokenizer load failed ({}): {e}", path.display()))
        })?;
        Ok(Self { tokenizer })
    }

    fn encode(&self, text: &str) -> Result<tokenizers::Encoding> {
        self.tokenizer
            .encode(text, false)
            .map_err(|e| ChunkerError::tokenizer(format!("encode failed: {e}")))
    }
}

#[cfg(feature = "hf-tokenizer")]
impl TokenEstimator for HfTokenizerEstimator {
    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.encode(text)?.len())
    }

    fn trim_to_budget(&self, text: &str, max_tokens: usize) -> Result<String> {
        let encoding = self.encode(text)?;
        if encoding.len() <= max_tokens {
            return Ok(text.to_string());
        }

        // Offsets are byte positions into `text`; cut after the last kept token.
        let offsets = encoding.get_offsets();
        let mut keep = max_tokens;
        while keep > 0 {
            let end = offsets[keep - 1].1;
            if let Some(prefix) = text.get(..end) {
                if self.count(prefix)? <= max_tokens {
                    return Ok(prefix.to_string());
                }
            }
            keep -= 1;
        }
        Ok(String::new())
    }

    fn name(&self) -> &'static str {
        "hugging_face"
    }
}
