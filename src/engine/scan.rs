//! Line scanning helpers shared by the block rules

use memchr::memchr;

/// One line of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Offset of the first byte of the line
    pub start: usize,
    /// Offset one past the line ending (or the end of input)
    pub end: usize,
    /// Line content without `\n` / `\r\n`
    pub text: &'a str,
}

impl<'a> Line<'a> {
    /// Whether the line has only whitespace
    #[inline]
    pub fn is_blank(&self) -> bool {
        is_blank(self.text)
    }

    /// Leading indentation in columns
    #[inline]
    pub fn indent(&self) -> usize {
        indent_width(self.text)
    }
}

/// Read the line starting at `pos`
///
/// Returns `None` at end of input.
#[inline]
pub fn line_at(input: &str, pos: usize) -> Option<Line<'_>> {
    if pos >= input.len() {
        return None;
    }
    let rest = &input[pos..];
    let (len, end) = match memchr(b'\n', rest.as_bytes()) {
        Some(nl) => (nl, pos + nl + 1),
        None => (rest.len(), input.len()),
    };
    let text = rest[..len].strip_suffix('\r').unwrap_or(&rest[..len]);
    Some(Line {
        start: pos,
        end,
        text,
    })
}

/// Iterate over lines from `pos` to the end of input
pub fn lines_from(input: &str, pos: usize) -> Lines<'_> {
    Lines { input, pos }
}

/// Iterator returned by [`lines_from`]
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = line_at(self.input, self.pos)?;
        self.pos = line.end;
        Some(line)
    }
}

/// Whether a string has only spaces, tabs and line endings
#[inline]
pub fn is_blank(text: &str) -> bool {
    text.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}

/// Markdown whitespace: other Unicode spaces are content
pub const BLANKS: [char; 4] = [' ', '\t', '\r', '\n'];

/// Trim spaces, tabs and line endings from both ends
#[inline]
pub fn trim_blank(text: &str) -> &str {
    text.trim_matches(BLANKS)
}

/// Trim spaces, tabs and line endings from the start
#[inline]
pub fn trim_blank_start(text: &str) -> &str {
    text.trim_start_matches(BLANKS)
}

/// Trim spaces, tabs and line endings from the end
#[inline]
pub fn trim_blank_end(text: &str) -> &str {
    text.trim_end_matches(BLANKS)
}

/// Leading indentation in columns (a tab advances to the next multiple of 4)
pub fn indent_width(text: &str) -> usize {
    let mut col = 0;
    for b in text.bytes() {
        match b {
            b' ' => col += 1,
            b'\t' => col += 4 - col % 4,
            _ => break,
        }
    }
    col
}

/// Remove up to `columns` columns of leading indentation
///
/// A tab that straddles the limit is removed entirely.
pub fn strip_indent(text: &str, columns: usize) -> &str {
    let mut col = 0;
    for (i, b) in text.bytes().enumerate() {
        if col >= columns {
            return &text[i..];
        }
        match b {
            b' ' => col += 1,
            b'\t' => col += 4 - col % 4,
            _ => return &text[i..],
        }
    }
    if col >= columns || text.bytes().all(|b| b == b' ' || b == b'\t') {
        &text[text.len()..]
    } else {
        text
    }
}

/// Number of leading spaces (not tabs), used for the 0-3 space prefix
#[inline]
pub fn leading_spaces(text: &str) -> usize {
    text.bytes().take_while(|&b| b == b' ').count()
}

/// Length of the run of `ch` at the start of `text`
#[inline]
pub fn run_length(text: &str, ch: u8) -> usize {
    text.bytes().take_while(|&b| b == ch).count()
}

/// Byte offset of the end of the last non-blank line in `input[start..end]`
///
/// Used to leave trailing blank lines for the blank-line rule. Returns
/// `start` if every line is blank.
pub fn trim_trailing_blank_lines(input: &str, start: usize, end: usize) -> usize {
    let mut last = start;
    for line in lines_from(&input[..end], start) {
        if !line.is_blank() {
            last = line.end;
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_blank_keeps_unicode_spaces() {
        assert_eq!(trim_blank(" \t\u{3000}a\u{a0} \r\n"), "\u{3000}a\u{a0}");
        assert_eq!(trim_blank_start("\t a "), "a ");
        assert_eq!(trim_blank_end(" a\t\n"), " a");
        assert_eq!(trim_blank("\u{2003}"), "\u{2003}");
    }

    #[test]
    fn test_line_at_strips_line_ending() {
        let input = "one\r\ntwo\nthree";
        let first = line_at(input, 0).unwrap();
        assert_eq!(first.text, "one");
        assert_eq!(first.end, 5);
        let second = line_at(input, first.end).unwrap();
        assert_eq!(second.text, "two");
        let third = line_at(input, second.end).unwrap();
        assert_eq!(third.text, "three");
        assert_eq!(third.end, input.len());
        assert!(line_at(input, input.len()).is_none());
    }

    #[test]
    fn test_lines_from_covers_input() {
        let input = "a\n\nb\n";
        let lines: Vec<_> = lines_from(input, 0).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].is_blank());
        assert_eq!(lines.last().unwrap().end, input.len());
    }

    #[test]
    fn test_indent_width() {
        assert_eq!(indent_width("    x"), 4);
        assert_eq!(indent_width("\tx"), 4);
        assert_eq!(indent_width("  \tx"), 4);
        assert_eq!(indent_width("x"), 0);
    }

    #[test]
    fn test_strip_indent() {
        assert_eq!(strip_indent("    code", 4), "code");
        assert_eq!(strip_indent("      code", 4), "  code");
        assert_eq!(strip_indent("\tcode", 4), "code");
        assert_eq!(strip_indent("  x", 4), "x");
        assert_eq!(strip_indent("   ", 2), " ");
        assert_eq!(strip_indent("  ", 4), "");
    }

    #[test]
    fn test_trim_trailing_blank_lines() {
        let input = "a\nb\n\n  \n";
        assert_eq!(trim_trailing_blank_lines(input, 0, input.len()), 4);
        assert_eq!(trim_trailing_blank_lines("\n\n", 0, 2), 0);
    }
}
