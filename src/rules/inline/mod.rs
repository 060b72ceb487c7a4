//! Inline rules
//!
//! Inline rules run over the text of one inline-bearing block. Spans that
//! contain further inline content (emphasis, links) parse it with a nested
//! context, so their children's spans index the span's content.

mod emphasis;
mod link;
mod text;

pub use emphasis::{Emphasis, Strikethrough, Strong};
pub use link::{Autolink, Link, NoLink, RefLink, Url};
pub use text::{CodeSpan, Escape, InlineHtml, InlineText, LineBreak};

use crate::engine::scan_cache::ScanCache;

/// Scan tables used by the inline rules in the per-run [`ScanCache`]
pub(crate) mod tables {
    /// `[` -> matching `]`
    pub const BRACKETS: u32 = 1;
    /// `(` -> matching `)` inside a link destination
    pub const PARENS: u32 = 2;
    /// Start of an HTML comment body -> first `-->`
    pub const COMMENT_CLOSE: u32 = 3;

    /// Backtick run of `len` -> next run of the same length
    pub fn code_close(len: usize) -> u32 {
        0x1000_0000 | len.min(0x0fff_ffff) as u32
    }

    /// Emphasis content start -> closer for `width` copies of `delim`
    pub fn closer(delim: u8, width: usize) -> u32 {
        0x100 | (u32::from(delim) << 2) | (width as u32 & 3)
    }

    /// Link title start -> unescaped `close`
    pub fn title_close(close: u8) -> u32 {
        0x10_0000 | u32::from(close)
    }
}

/// Find the closing backtick run of exactly `len` backticks at or after
/// `from`, returning its start
///
/// `from` must not sit inside a backtick run.
pub(crate) fn find_code_close(
    bytes: &[u8],
    from: usize,
    len: usize,
    scans: &ScanCache,
) -> Option<usize> {
    let table = tables::code_close(len);
    if let Some(hit) = scans.covering(table, from) {
        return hit;
    }
    let mut found = None;
    let mut i = from;
    while i < bytes.len() {
        let Some(offset) = memchr::memchr(b'`', &bytes[i..]) else {
            break;
        };
        let start = i + offset;
        let run = backtick_run(bytes, start);
        if run == len {
            found = Some(start);
            break;
        }
        i = start + run;
    }
    scans.record_range(table, from, found);
    found
}

/// Length of the backtick run at `at`
#[inline]
pub(crate) fn backtick_run(bytes: &[u8], at: usize) -> usize {
    bytes[at..].iter().take_while(|&&b| b == b'`').count()
}

/// Position after the code span (or lone backtick run) starting at `at`
#[inline]
pub(crate) fn skip_code(bytes: &[u8], at: usize, scans: &ScanCache) -> usize {
    let run = backtick_run(bytes, at);
    find_code_close(bytes, at + run, run, scans).map_or(at + run, |close| close + run)
}

/// Whether a byte belongs to a word, for `_` boundary checks
///
/// Non-ASCII bytes count as word bytes.
#[inline]
pub(crate) fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_code_close() {
        let bytes = b"a ``b` c`` d";
        assert_eq!(find_code_close(bytes, 0, 2, &ScanCache::new()), Some(2));
        assert_eq!(find_code_close(bytes, 4, 2, &ScanCache::new()), Some(8));
        assert_eq!(find_code_close(bytes, 4, 3, &ScanCache::new()), None);
    }

    #[test]
    fn test_failed_code_close_is_remembered() {
        let scans = ScanCache::new();
        let bytes = b"`a `` b";
        assert_eq!(find_code_close(bytes, 1, 1, &scans), None);
        assert_eq!(scans.covering(tables::code_close(1), 5), Some(None));
        assert_eq!(find_code_close(bytes, 5, 1, &scans), None);
        assert_eq!(skip_code(bytes, 3, &scans), 5);
    }
}
