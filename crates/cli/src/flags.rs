use clap::ValueEnum;
use ragmd_chunker::TokenizerKind;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum TokenizerFlag {
    /// Four characters per token, no model
    CharRatio,
    /// OpenAI cl100k_base BPE
    Cl100k,
}

impl TokenizerFlag {
    pub(crate) const fn as_domain(self) -> TokenizerKind {
        match self {
            TokenizerFlag::CharRatio => TokenizerKind::char_ratio(),
            TokenizerFlag::Cl100k => TokenizerKind::Cl100k,
        }
    }
}
