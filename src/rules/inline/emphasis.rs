//! Delimited spans: `*em*`, `**strong**` and `~~strike~~`
//!
//! A span opens on a delimiter run followed by non-whitespace and closes on
//! the nearest matching run preceded by non-whitespace. Escapes and code
//! spans between the delimiters are skipped while looking for the closer.
//! `_` delimiters must not sit inside a word.
//!
//! Closer scans are remembered for the rest of the run, so a line full of
//! unclosed openers costs one scan rather than one per opener.

use crate::engine::context::InlineContext;
use crate::engine::error::EngineError;
use crate::engine::rule::{Applied, Match, Rule};
use crate::engine::scan_cache::ScanCache;
use crate::engine::source_location::Span;
use crate::engine::token::{Token, TokenKind};
use crate::rules::inline::{is_word_byte, skip_code, tables};
use crate::rules::names;

/// Closer inside the delimiter run `start..start + run`, for a span whose
/// content starts at `from`
fn closer_in_run(
    bytes: &[u8],
    start: usize,
    run: usize,
    from: usize,
    delim: u8,
    width: usize,
) -> Option<usize> {
    let at = match width {
        1 if run % 2 == 1 => start + run - 1,
        2 if run >= 2 => start + run - 2,
        _ => return None,
    };
    let has_content = at > from && !bytes[at - 1].is_ascii_whitespace();
    let at_boundary =
        delim != b'_' || bytes.get(start + run).map_or(true, |&next| !is_word_byte(next));
    (has_content && at_boundary).then_some(at)
}

/// First closer in a delimiter run starting at or after `from`
///
/// `from` must not sit inside a run of `delim`.
fn next_closer(
    bytes: &[u8],
    from: usize,
    delim: u8,
    width: usize,
    scans: &ScanCache,
) -> Option<usize> {
    let table = tables::closer(delim, width);
    if let Some(hit) = scans.covering(table, from) {
        return hit;
    }

    let mut skipped = Vec::new();
    let mut found = None;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let end = skip_code(bytes, i, scans);
                skipped.push((i, end));
                i = end;
            }
            b if b == delim => {
                let run = bytes[i..].iter().take_while(|&&c| c == delim).count();
                if let Some(at) = closer_in_run(bytes, i, run, from, delim, width) {
                    found = Some(at);
                    break;
                }
                i += run;
            }
            _ => i += 1,
        }
    }

    scans.record_range_skipping(table, from, found, skipped);
    found
}

/// Start of the closing delimiter for a span whose content starts at `from`
fn find_closer(
    input: &str,
    from: usize,
    delim: u8,
    width: usize,
    scans: &ScanCache,
) -> Option<usize> {
    let bytes = input.as_bytes();
    let lead = bytes[from..].iter().take_while(|&&c| c == delim).count();
    if lead > 0 {
        if let Some(at) = closer_in_run(bytes, from, lead, from, delim, width) {
            return Some(at);
        }
    }
    next_closer(bytes, from + lead, delim, width, scans)
}

/// Match a span delimited by `width` copies of one of `delims`
fn delimited(input: &str, pos: usize, cx: &InlineContext, delims: &[u8], width: usize) -> Option<Match> {
    let bytes = input.as_bytes();
    let delim = *bytes.get(pos)?;
    if !delims.contains(&delim) || !cx.state().can_nest() {
        return None;
    }
    if bytes.get(pos..pos + width)?.iter().any(|&b| b != delim) {
        return None;
    }
    if delim == b'_' && pos > 0 && is_word_byte(bytes[pos - 1]) {
        return None;
    }
    let from = pos + width;
    if bytes.get(from).map_or(true, |b| b.is_ascii_whitespace()) {
        return None;
    }

    let close = find_closer(input, from, delim, width, cx.scans())?;
    Some(Match::new(pos, close + width).with_groups(vec![None, Some((from, close))]))
}

/// Parse the content of a delimited span into a token of `kind`
fn nest(m: &Match, input: &str, cx: &InlineContext, kind: TokenKind) -> Result<Applied, EngineError> {
    let content = m.group_str(input, 1).unwrap_or_default();
    let children = match cx.nested() {
        Some(inner) => inner.parse(content)?,
        None => vec![Token::text(content, Span::new(0, content.len()))],
    };
    Ok(Applied::single(
        Token::with_children(kind, m.span(), children),
        m.len(),
    ))
}

/// `**strong**` or `__strong__`
#[derive(Debug, Clone, Copy, Default)]
pub struct Strong;

impl Rule<InlineContext> for Strong {
    fn name(&self) -> &str {
        names::STRONG
    }

    fn try_match(&self, input: &str, pos: usize, cx: &InlineContext) -> Option<Match> {
        delimited(input, pos, cx, b"*_", 2)
    }

    fn apply(&self, m: &Match, input: &str, cx: &InlineContext) -> Result<Applied, EngineError> {
        nest(m, input, cx, TokenKind::Strong)
    }
}

/// `*emphasis*` or `_emphasis_`
#[derive(Debug, Clone, Copy, Default)]
pub struct Emphasis;

impl Rule<InlineContext> for Emphasis {
    fn name(&self) -> &str {
        names::EMPHASIS
    }

    fn try_match(&self, input: &str, pos: usize, cx: &InlineContext) -> Option<Match> {
        delimited(input, pos, cx, b"*_", 1)
    }

    fn apply(&self, m: &Match, input: &str, cx: &InlineContext) -> Result<Applied, EngineError> {
        nest(m, input, cx, TokenKind::Emphasis)
    }
}

/// `~~strikethrough~~`
#[derive(Debug, Clone, Copy, Default)]
pub struct Strikethrough;

impl Rule<InlineContext> for Strikethrough {
    fn name(&self) -> &str {
        names::STRIKETHROUGH
    }

    fn try_match(&self, input: &str, pos: usize, cx: &InlineContext) -> Option<Match> {
        delimited(input, pos, cx, b"~", 2)
    }

    fn apply(&self, m: &Match, input: &str, cx: &InlineContext) -> Result<Applied, EngineError> {
        nest(m, input, cx, TokenKind::Strikethrough)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closer(input: &str, from: usize, delim: u8, width: usize) -> Option<usize> {
        find_closer(input, from, delim, width, &ScanCache::new())
    }

    #[test]
    fn test_find_closer_single() {
        assert_eq!(closer("*a*", 1, b'*', 1), Some(2));
        assert_eq!(closer("*a **b***", 1, b'*', 1), Some(8));
        assert_eq!(closer("*a *", 1, b'*', 1), None);
        assert_eq!(closer("*a `*` b*", 1, b'*', 1), Some(8));
        assert_eq!(closer("*a \\* b*", 1, b'*', 1), Some(7));
    }

    #[test]
    fn test_find_closer_double() {
        assert_eq!(closer("**a**", 2, b'*', 2), Some(3));
        assert_eq!(closer("***a***", 2, b'*', 2), Some(5));
        assert_eq!(closer("**a*", 2, b'*', 2), None);
    }

    #[test]
    fn test_underscore_needs_word_boundary() {
        assert_eq!(closer("_a_b_", 1, b'_', 1), Some(4));
        assert_eq!(closer("_a_b", 1, b'_', 1), None);
    }

    #[test]
    fn test_failed_scan_answers_later_openers() {
        let scans = ScanCache::new();
        let input = "*a *b *c";
        assert_eq!(find_closer(input, 1, b'*', 1, &scans), None);
        assert_eq!(scans.covering(tables::closer(b'*', 1), 4), Some(None));
        assert_eq!(find_closer(input, 7, b'*', 1, &scans), None);
    }

    #[test]
    fn test_opener_inside_skipped_code_is_rescanned() {
        let scans = ScanCache::new();
        let input = "*a `x *b*` y";
        assert_eq!(find_closer(input, 1, b'*', 1, &scans), None);
        assert_eq!(scans.covering(tables::closer(b'*', 1), 7), None);
        assert_eq!(find_closer(input, 7, b'*', 1, &scans), Some(8));
    }
}
