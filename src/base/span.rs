//! Source positions for model elements and diagnostics.
//!
//! Two coordinate systems are in play: byte offsets ([`TextSize`],
//! [`TextRange`]) as produced by the parser, and line/column pairs
//! ([`Position`], [`LineCol`]) as consumed by diagnostics and editors.
//! [`LineIndex`] converts between them. All line/column values are
//! 0-indexed for LSP compatibility.

pub use text_size::{TextRange, TextSize};

/// A position in source code (0-indexed line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 1-based in human-readable output
        write!(f, "line {}:{}", self.line + 1, self.column + 1)
    }
}

/// A range in source code, attached to model elements for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-length span at a single position.
    pub fn point(line: u32, column: u32) -> Self {
        let pos = Position::new(line, column);
        Self::new(pos, pos)
    }

    pub fn from_coords(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self::new(
            Position::new(start_line, start_col),
            Position::new(end_line, end_col),
        )
    }

    /// Whether `position` falls inside this span (inclusive bounds).
    ///
    /// Positions order lexicographically by line then column, so containment
    /// is a plain range check.
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }
}

/// Line/column pair produced by [`LineIndex`] lookups (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Maps byte offsets to line/column pairs for one source text.
///
/// Built once per file; lookups are a binary search over line starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the start of each line, always beginning with 0.
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(TextSize::from(offset as u32 + 1));
            }
        }
        Self { line_starts }
    }

    /// Number of lines in the indexed text (at least 1, even when empty).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset into a 0-indexed line/column pair.
    ///
    /// Offsets past the end of a line clamp to that line; the column is a
    /// byte column, which matches what the parser reports for ASCII input.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = offset - self.line_starts[line];
        LineCol {
            line: line as u32,
            col: col.into(),
        }
    }

    /// Byte offset of the first character of `line`, if the line exists.
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        self.line_starts.get(line as usize).copied()
    }
}
