//! Splitting section text into paragraph, fenced-code and table blocks.

const FENCE: &str = "```";
const TILDE_FENCE: &str = "~~~";

/// Structural class of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Blank-line separated prose, may be split into sentences
    Prose,
    /// Contains a ``` or ~~~ fence
    Code,
    /// Majority of lines start with a pipe
    Table,
}

impl BlockKind {
    /// Classify a block produced by [`split_blocks`]
    #[must_use]
    pub fn classify(block: &str) -> Self {
        if block.contains(FENCE) || block.contains(TILDE_FENCE) {
            return Self::Code;
        }

        let lines: Vec<&str> = block.lines().filter(|ln| !ln.trim().is_empty()).collect();
        if lines.is_empty() {
            return Self::Prose;
        }
        let leading_pipes = lines
            .iter()
            .filter(|ln| ln.trim_start().starts_with('|'))
            .count();
        if leading_pipes >= (lines.len() / 2).max(2) {
            Self::Table
        } else {
            Self::Prose
        }
    }

    /// Atomic blocks are never split internally, whatever their size
    #[must_use]
    pub const fn is_atomic(self) -> bool {
        matches!(self, Self::Code | Self::Table)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prose => "prose",
            Self::Code => "code",
            Self::Table => "table",
        }
    }
}

/// Opening run of a fence line: three or more backticks or tildes.
///
/// The info string is not part of the marker. A fence closes on a line whose trimmed
/// form equals its opening marker.
#[must_use]
pub fn fence_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run = trimmed.len() - trimmed.trim_start_matches(first).len();
    (run >= 3).then(|| &trimmed[..run])
}

/// Split one section's text into ordered, trimmed, non-empty blocks.
///
/// Blank lines separate prose blocks. Inside a fence, lines are copied verbatim until
/// a line equal to the opening marker closes it, and the closed fence ends the
/// block. A run of pipe-prefixed lines forms a table that ends at the first line
/// without a leading pipe; that line then starts the next block. An unclosed fence
/// keeps everything up to the end of the text in one block.
#[must_use]
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut splitter = BlockSplitter::default();
    for line in text.lines() {
        splitter.push_line(line);
    }
    splitter.finish()
}

#[derive(Default)]
struct BlockSplitter<'a> {
    blocks: Vec<String>,
    buf: Vec<&'a str>,
    fence: Option<&'a str>,
    in_table: bool,
}

impl<'a> BlockSplitter<'a> {
    fn push_line(&mut self, line: &'a str) {
        let trimmed = line.trim();

        if let Some(marker) = self.fence {
            self.buf.push(line);
            if trimmed == marker {
                self.fence = None;
                self.flush();
            }
            return;
        }

        if self.in_table {
            if trimmed.starts_with('|') {
                self.buf.push(line);
                return;
            }
            self.in_table = false;
            self.flush();
        }

        if trimmed.is_empty() {
            self.flush();
            return;
        }

        if let Some(marker) = fence_marker(trimmed) {
            self.fence = Some(marker);
        } else if trimmed.starts_with('|') {
            self.in_table = true;
        }
        self.buf.push(line);
    }

    fn flush(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let block = self.buf.join("\n");
        self.buf.clear();
        let block = block.trim();
        if !block.is_empty() {
            self.blocks.push(block.to_string());
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.blocks
    }
}
