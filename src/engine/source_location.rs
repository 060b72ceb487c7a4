//! Source Location Utilities
//!
//! Tokens carry a [`Span`]: a byte range into the text handed to the engine
//! run that produced them. [`SourcePosition`] turns a byte offset into a
//! 1-based line/column pair for diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A byte range in the text of one parsing scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// First byte covered by the span
    pub start: usize,
    /// One past the last byte covered by the span
    pub end: usize,
}

impl Span {
    /// Create a new span
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Get the length of this span in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if this is a zero-length span
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this span contains an offset
    #[inline]
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Check if this span ends exactly where `other` starts
    #[inline]
    pub fn is_followed_by(&self, other: &Span) -> bool {
        self.end == other.start
    }

    /// Merge this span with another, returning a span that covers both
    #[inline]
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Get the text covered by this span, if it lies on char boundaries
    #[inline]
    pub fn slice<'a>(&self, input: &'a str) -> Option<&'a str> {
        input.get(self.start..self.end)
    }

    /// Resolve both ends of the span to line/column positions
    pub fn positions(&self, input: &str) -> (SourcePosition, SourcePosition) {
        (
            SourcePosition::from_offset(input, self.start),
            SourcePosition::from_offset(input, self.end),
        )
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A position in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    /// Byte offset from start of input
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, counted in chars)
    pub column: usize,
}

impl SourcePosition {
    /// Create a new source position
    #[inline]
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Create a position at the start of input
    #[inline]
    pub fn start() -> Self {
        Self::new(0, 1, 1)
    }

    /// Calculate position from an offset in the input
    pub fn from_offset(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());

        let mut line = 1;
        let mut column = 1;

        for (at, ch) in input.char_indices() {
            if at >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::start()
    }
}

/// Get the line content at a given offset, without its line ending
pub fn line_at_offset(input: &str, offset: usize) -> &str {
    let mut offset = offset.min(input.len());
    while !input.is_char_boundary(offset) {
        offset -= 1;
    }

    let line_start = input[..offset].rfind('\n').map_or(0, |pos| pos + 1);
    let line_end = input[offset..]
        .find('\n')
        .map_or(input.len(), |pos| offset + pos);

    input[line_start..line_end].trim_end_matches('\r')
}
