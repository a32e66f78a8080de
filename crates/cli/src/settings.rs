use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ragmd_chunker::{ChunkerConfig, TokenizerKind};

use crate::flags::TokenizerFlag;

/// Chunker settings given on the command line; `None` keeps the file/default value
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub tokenizer: Option<TokenizerFlag>,
    pub hf_tokenizer: Option<PathBuf>,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub overlap: Option<usize>,
}

/// Resolve the chunker configuration: defaults < TOML file < flags
pub(crate) fn resolve(config_path: Option<&Path>, overrides: &Overrides) -> Result<ChunkerConfig> {
    let mut config = match config_path {
        Some(path) => load_file(path)?,
        None => ChunkerConfig::default(),
    };

    if let Some(flag) = overrides.tokenizer {
        config.tokenizer = flag.as_domain();
    }
    if let Some(path) = &overrides.hf_tokenizer {
        config.tokenizer = TokenizerKind::HuggingFace { path: path.clone() };
    }
    if let Some(min) = overrides.min {
        config.target_tokens_min = min;
    }
    if let Some(max) = overrides.max {
        config.target_tokens_max = max;
    }
    if let Some(overlap) = overrides.overlap {
        config.overlap_tokens = overlap;
    }

    log::debug!(
        "Chunker config: min={} max={} overlap={} tokenizer={}",
        config.target_tokens_min,
        config.target_tokens_max,
        config.overlap_tokens,
        config.tokenizer.as_str()
    );
    Ok(config)
}

fn load_file(path: &Path) -> Result<ChunkerConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
}
