//! Sentence-level splitting of oversized prose blocks.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::token::TokenEstimator;

/// Terminal punctuation followed by whitespace. The punctuation stays with the
/// sentence it ends; only the whitespace is consumed.
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary pattern is valid"));

/// Split `text` after `.`, `!` or `?` followed by whitespace.
///
/// Fragments are trimmed and empty ones dropped.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // Punctuation is a single ASCII byte.
        let end = boundary.start() + 1;
        push_trimmed(&mut sentences, &text[start..end]);
        start = boundary.end();
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, fragment: &'a str) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        out.push(fragment);
    }
}

/// Pack sentences of an oversized prose block into pieces of at most `max_tokens`.
///
/// Consecutive sentences are joined with a single space while the running count stays
/// within budget. A sentence that on its own reaches `max_tokens` is hard-wrapped into
/// fixed-width character slices, each emitted as its own piece.
pub fn split_to_max_tokens(
    text: &str,
    max_tokens: usize,
    estimator: &dyn TokenEstimator,
) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut buf: Vec<&str> = Vec::new();
    let mut tokens = 0;

    for sentence in split_sentences(text) {
        let n = estimator.count(sentence)?;
        if n >= max_tokens {
            if !buf.is_empty() {
                out.push(buf.join(" "));
                buf.clear();
            }
            let width = max_tokens.saturating_mul(estimator.chars_per_token());
            log::trace!(
                "hard-wrapping {n}-token sentence into {width}-char slices (max {max_tokens})"
            );
            out.extend(hard_wrap(sentence, width));
            tokens = 0;
            continue;
        }

        if tokens + n > max_tokens && !buf.is_empty() {
            out.push(buf.join(" "));
            buf.clear();
            buf.push(sentence);
            tokens = n;
        } else {
            buf.push(sentence);
            tokens += n;
        }
    }

    if !buf.is_empty() {
        out.push(buf.join(" "));
    }
    Ok(out)
}

/// Cut `text` into consecutive slices of `width` characters (the last may be shorter).
#[must_use]
pub fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut slice_start = 0;
    for (seen, (idx, _)) in text.char_indices().enumerate() {
        if seen > 0 && seen % width == 0 {
            out.push(text[slice_start..idx].to_string());
            slice_start = idx;
        }
    }
    if slice_start < text.len() {
        out.push(text[slice_start..].to_string());
    }
    out
}
