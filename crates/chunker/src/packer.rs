//! Token-bounded accumulation of blocks into chunks.
//!
//! The packer consumes one section's blocks in order. Blocks that fit are accumulated
//! until the next one would overflow `target_tokens_max`; buffers still under
//! `target_tokens_min` absorb the overflowing block instead of being emitted small.
//! Oversized prose is fed in sentence-packed pieces, oversized code or tables are
//! emitted whole on their own. After an undersized buffer absorbs an overflowing piece
//! or a sentence piece fills the buffer, the trailing pieces that fit in
//! `overlap_tokens` are carried into the next chunk. A buffer that is simply full
//! starts the next chunk from the incoming piece alone.

use crate::blocks::BlockKind;
use crate::config::ChunkerConfig;
use crate::error::Result;
use crate::sentences::split_to_max_tokens;
use crate::token::TokenEstimator;

/// Content of one emitted chunk, before metadata is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedChunk {
    pub content: String,
    /// Estimated tokens of `content`
    pub tokens: usize,
}

#[derive(Debug, Clone)]
struct Piece {
    text: String,
    tokens: usize,
}

/// Per-section packing state
pub struct Packer<'a> {
    estimator: &'a dyn TokenEstimator,
    min_tokens: usize,
    max_tokens: usize,
    overlap_tokens: usize,
    carries_overlap: bool,
    current: Vec<Piece>,
    current_tokens: usize,
    emitted: Vec<PackedChunk>,
}

impl<'a> Packer<'a> {
    #[must_use]
    pub fn new(estimator: &'a dyn TokenEstimator, config: &ChunkerConfig) -> Self {
        Self {
            estimator,
            min_tokens: config.target_tokens_min,
            max_tokens: config.target_tokens_max,
            overlap_tokens: config.overlap_tokens,
            carries_overlap: config.keeps_overlap(),
            current: Vec::new(),
            current_tokens: 0,
            emitted: Vec::new(),
        }
    }

    /// Feed one block produced by the block splitter
    pub fn ingest_block(&mut self, block: &str) -> Result<()> {
        let n = self.estimator.count(block)?;
        if n < self.max_tokens {
            return self.ingest_piece(block.to_string(), n);
        }

        let kind = BlockKind::classify(block);
        if kind.is_atomic() {
            log::trace!(
                "emitting {} block of {n} tokens whole (max {})",
                kind.as_str(),
                self.max_tokens
            );
            self.flush(true)?;
            self.current = vec![Piece {
                text: block.to_string(),
                tokens: n,
            }];
            self.current_tokens = n;
            return self.emit(true, false);
        }

        for text in split_to_max_tokens(block, self.max_tokens, self.estimator)? {
            let pn = self.estimator.count(&text)?;
            while !self.current.is_empty() && self.current_tokens + pn > self.max_tokens {
                self.flush(false)?;
            }
            self.current.push(Piece { text, tokens: pn });
            self.current_tokens += pn;
            if self.current_tokens >= self.max_tokens {
                self.flush(true)?;
            }
        }
        Ok(())
    }

    /// Feed a piece already known to be below `target_tokens_max`
    pub fn ingest_piece(&mut self, text: String, tokens: usize) -> Result<()> {
        let piece = Piece { text, tokens };

        if self.current_tokens + tokens <= self.max_tokens {
            self.append(piece);
            return Ok(());
        }

        if self.current_tokens < self.min_tokens {
            // Overshoot rather than emit an undersized chunk.
            self.append(piece);
            return self.flush(true);
        }

        self.flush(true)?;
        self.reset();
        self.append(piece);
        Ok(())
    }

    /// Emit the pending pieces as one chunk.
    ///
    /// With `keep_overlap` and a positive overlap budget, the longest run of trailing
    /// pieces whose tokens sum to at most `overlap_tokens` stays pending.
    pub fn flush(&mut self, keep_overlap: bool) -> Result<()> {
        self.emit(keep_overlap, true)
    }

    fn emit(&mut self, keep_overlap: bool, enforce_budget: bool) -> Result<()> {
        if self.current.is_empty() {
            return Ok(());
        }

        let joined = self
            .current
            .iter()
            .map(|piece| piece.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let mut content = joined.trim().to_string();
        let mut tokens = self.estimator.count(&content)?;
        if enforce_budget && tokens > self.max_tokens {
            log::debug!(
                "truncating {tokens}-token chunk to {} tokens",
                self.max_tokens
            );
            content = self.estimator.trim_to_budget(&content, self.max_tokens)?;
            tokens = self.estimator.count(&content)?;
        }
        if content.is_empty() {
            self.reset();
            return Ok(());
        }
        self.emitted.push(PackedChunk { content, tokens });

        if keep_overlap && self.carries_overlap {
            let mut carried = 0;
            let mut keep = 0;
            for piece in self.current.iter().rev() {
                if carried + piece.tokens > self.overlap_tokens {
                    break;
                }
                carried += piece.tokens;
                keep += 1;
            }
            let start = self.current.len() - keep;
            self.current.drain(..start);
            self.current_tokens = carried;
        } else {
            self.reset();
        }
        Ok(())
    }

    /// Drop all pending pieces
    pub fn reset(&mut self) {
        self.current.clear();
        self.current_tokens = 0;
    }

    /// Flush the remainder and return every chunk emitted for the section
    pub fn finish(mut self) -> Result<Vec<PackedChunk>> {
        self.flush(true)?;
        Ok(self.emitted)
    }

    /// Pending tokens
    #[must_use]
    pub const fn current_tokens(&self) -> usize {
        self.current_tokens
    }

    fn append(&mut self, piece: Piece) {
        self.current_tokens += piece.tokens;
        self.current.push(piece);
    }
}

/// Pack a section's blocks with a fresh packer
pub fn pack_blocks<'b>(
    blocks: impl IntoIterator<Item = &'b str>,
    estimator: &dyn TokenEstimator,
    config: &ChunkerConfig,
) -> Result<Vec<PackedChunk>> {
    let mut packer = Packer::new(estimator, config);
    for block in blocks {
        packer.ingest_block(block)?;
    }
    packer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerKind;
    use crate::error::ChunkerError;
    use crate::token::CharRatioEstimator;
    use pretty_assertions::assert_eq;

    fn config(min: usize, max: usize, overlap: usize) -> ChunkerConfig {
        ChunkerConfig::default()
            .with_limits(min, max, overlap)
            .with_tokenizer(TokenizerKind::char_ratio())
    }

    /// A paragraph of exactly `tokens` tokens under the 4-chars-per-token estimator
    fn para(tag: char, tokens: usize) -> String {
        let mut text = String::new();
        text.push(tag);
        text.push_str(&"w".repeat(tokens * 4 - 1));
        text
    }

    fn contents(chunks: &[PackedChunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.content.as_str()).collect()
    }

    #[test]
    fn small_paragraph_becomes_single_chunk() {
        let est = CharRatioEstimator::default();
        let p = para('a', 40);
        let chunks = pack_blocks([p.as_str()], &est, &config(500, 800, 100)).unwrap();
        assert_eq!(contents(&chunks), vec![p.as_str()]);
        assert_eq!(chunks[0].tokens, 40);
    }

    #[test]
    fn small_paragraphs_accumulate() {
        let est = CharRatioEstimator::default();
        let (a, b, c) = (para('a', 10), para('b', 10), para('c', 10));
        let chunks = pack_blocks([a.as_str(), b.as_str(), c.as_str()], &est, &config(5, 100, 10))
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, format!("{a}\n\n{b}\n\n{c}"));
    }

    #[test]
    fn paragraphs_that_do_not_fit_are_split_apart() {
        let est = CharRatioEstimator::default();
        let (a, b) = (para('a', 300), para('b', 300));
        let chunks =
            pack_blocks([a.as_str(), b.as_str()], &est, &config(200, 500, 100)).unwrap();
        assert_eq!(contents(&chunks), vec![a.as_str(), b.as_str()]);
    }

    #[test]
    fn full_buffer_starts_next_chunk_without_carry() {
        let est = CharRatioEstimator::default();
        let ps: Vec<String> = ['a', 'b', 'c', 'd'].iter().map(|&t| para(t, 10)).collect();
        let chunks = pack_blocks(ps.iter().map(String::as_str), &est, &config(5, 25, 12)).unwrap();
        assert_eq!(
            contents(&chunks),
            vec![
                format!("{}\n\n{}", ps[0], ps[1]),
                format!("{}\n\n{}", ps[2], ps[3]),
            ]
        );
    }

    #[test]
    fn zero_overlap_carries_nothing() {
        let est = CharRatioEstimator::default();
        let ps: Vec<String> = ['a', 'b', 'c', 'd'].iter().map(|&t| para(t, 10)).collect();
        let chunks = pack_blocks(ps.iter().map(String::as_str), &est, &config(5, 25, 0)).unwrap();
        assert_eq!(
            contents(&chunks),
            vec![
                format!("{}\n\n{}", ps[0], ps[1]),
                format!("{}\n\n{}", ps[2], ps[3]),
            ]
        );
    }

    #[test]
    fn absorbed_piece_is_carried_into_next_chunk() {
        let est = CharRatioEstimator::default();
        let (a, b, c) = (para('a', 20), para('b', 10), para('c', 10));
        let chunks =
            pack_blocks([a.as_str(), b.as_str(), c.as_str()], &est, &config(25, 25, 12)).unwrap();
        assert_eq!(
            contents(&chunks),
            vec![&format!("{a}\n\n{b}")[..100], &format!("{b}\n\n{c}")[..]]
        );
        assert_eq!(chunks[0].tokens, 25);
        assert_eq!(chunks[1].tokens, 21);
    }

    #[test]
    fn pending_piece_before_oversized_prose_is_flushed_without_carry() {
        let est = CharRatioEstimator::default();
        let p = para('p', 5);
        // three 8-token sentences, 25 tokens as one block
        let sentence = format!("{}.", "s".repeat(31));
        let block = vec![sentence.as_str(); 3].join(" ");
        assert_eq!(est.count(&block).unwrap(), 25);

        let chunks = pack_blocks([p.as_str(), block.as_str()], &est, &config(1, 20, 12)).unwrap();
        assert_eq!(
            contents(&chunks),
            vec![
                p.as_str(),
                &format!("{sentence} {sentence}")[..],
                sentence.as_str(),
            ]
        );
        assert_eq!(chunks[1].tokens, 17);
    }

    #[test]
    fn undersized_buffer_absorbs_overflowing_piece_and_truncates() {
        let est = CharRatioEstimator::default();
        let (a, b) = (para('a', 10), para('b', 20));
        let chunks = pack_blocks([a.as_str(), b.as_str()], &est, &config(15, 25, 0)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].tokens, 25);
        assert!(chunks[0].content.starts_with(&a));
        assert_eq!(chunks[0].content, &format!("{a}\n\n{b}")[..100]);
    }

    #[test]
    fn oversized_fence_is_emitted_whole() {
        let est = CharRatioEstimator::default();
        let body = "let x = 1;\n".repeat(330);
        let fence = format!("```rust\n{body}```");
        assert!(est.count(&fence).unwrap() >= 900);

        let chunks = pack_blocks([fence.as_str()], &est, &config(500, 800, 100)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, fence);
        assert!(chunks[0].tokens > 800);
    }

    #[test]
    fn atomic_block_is_not_merged_with_neighbours() {
        let est = CharRatioEstimator::default();
        let before = para('a', 5);
        let table = (0..20)
            .map(|i| format!("| row {i:02} | value |"))
            .collect::<Vec<_>>()
            .join("\n");
        let after = para('z', 5);
        let chunks = pack_blocks(
            [before.as_str(), table.as_str(), after.as_str()],
            &est,
            &config(1, 50, 0),
        )
        .unwrap();
        assert_eq!(
            contents(&chunks),
            vec![before.as_str(), table.as_str(), after.as_str()]
        );
    }

    #[test]
    fn oversized_prose_is_split_by_sentences() {
        let est = CharRatioEstimator::default();
        // 10 sentences of 8 tokens each
        let sentence = format!("{}.", "s".repeat(31));
        let block = vec![sentence.as_str(); 10].join(" ");
        let chunks = pack_blocks([block.as_str()], &est, &config(10, 20, 0)).unwrap();

        assert!(chunks.len() >= 4);
        for chunk in &chunks {
            assert!(chunk.tokens <= 20, "chunk over budget: {}", chunk.tokens);
        }
        let words: usize = chunks
            .iter()
            .map(|c| c.content.matches(sentence.as_str()).count())
            .sum();
        assert_eq!(words, 10);
    }

    #[test]
    fn empty_input_emits_nothing() {
        let est = CharRatioEstimator::default();
        let chunks = pack_blocks(std::iter::empty(), &est, &config(500, 800, 100)).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn flush_resets_when_nothing_is_pending() {
        let est = CharRatioEstimator::default();
        let cfg = config(5, 25, 12);
        let mut packer = Packer::new(&est, &cfg);
        packer.flush(true).unwrap();
        packer.ingest_piece(para('a', 10), 10).unwrap();
        assert_eq!(packer.current_tokens(), 10);
        packer.reset();
        assert_eq!(packer.current_tokens(), 0);
        assert!(packer.finish().unwrap().is_empty());
    }

    struct FailingEstimator;

    impl TokenEstimator for FailingEstimator {
        fn count(&self, _text: &str) -> Result<usize> {
            Err(ChunkerError::tokenizer("model unavailable"))
        }

        fn trim_to_budget(&self, text: &str, _max_tokens: usize) -> Result<String> {
            Ok(text.to_string())
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn estimator_failure_propagates() {
        let err = pack_blocks(["text"], &FailingEstimator, &config(5, 25, 0)).unwrap_err();
        assert!(matches!(err, ChunkerError::Tokenizer(msg) if msg == "model unavailable"));
    }
}
