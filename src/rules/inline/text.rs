//! Inline leaves: escapes, code spans, line breaks, raw HTML and text

use crate::engine::context::InlineContext;
use crate::engine::error::EngineError;
use crate::engine::regex_cache::captures_at;
use crate::engine::rule::{Applied, Match, Rule};
use crate::engine::scan::trim_blank;
use crate::engine::token::{Token, TokenKind};
use crate::rules::inline::{backtick_run, find_code_close, is_word_byte, tables};
use crate::rules::names;

const MARKDOWN_ESCAPABLE: &str = "\\`*_{}[]()#+-.!<>";
const GFM_ESCAPABLE: &str = "\\`*_{}[]()#+-.!<>~|";

/// Backslash followed by an escapable punctuation character
#[derive(Debug, Clone, Copy)]
pub struct Escape {
    escapable: &'static str,
}

impl Escape {
    /// Markdown's escapable set
    pub fn markdown() -> Self {
        Self {
            escapable: MARKDOWN_ESCAPABLE,
        }
    }

    /// Markdown's set plus `~` and `|`
    pub fn gfm() -> Self {
        Self {
            escapable: GFM_ESCAPABLE,
        }
    }
}

impl Rule<InlineContext> for Escape {
    fn name(&self) -> &str {
        names::ESCAPE
    }

    fn try_match(&self, input: &str, pos: usize, _cx: &InlineContext) -> Option<Match> {
        let bytes = input.as_bytes();
        if bytes.get(pos) != Some(&b'\\') {
            return None;
        }
        let next = *bytes.get(pos + 1)?;
        (next.is_ascii() && self.escapable.as_bytes().contains(&next))
            .then(|| Match::new(pos, pos + 2))
    }

    fn apply(&self, m: &Match, input: &str, _cx: &InlineContext) -> Result<Applied, EngineError> {
        let escaped = &input[m.start + 1..m.end];
        Ok(Applied::single(Token::text(escaped, m.span()), m.len()))
    }
}

/// `` `code` `` spans
///
/// A backtick run is closed by the next run of the same length. Without
/// one, the run is literal text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeSpan;

impl Rule<InlineContext> for CodeSpan {
    fn name(&self) -> &str {
        names::CODE
    }

    fn try_match(&self, input: &str, pos: usize, cx: &InlineContext) -> Option<Match> {
        let bytes = input.as_bytes();
        if bytes.get(pos) != Some(&b'`') {
            return None;
        }
        let len = backtick_run(bytes, pos);
        let close = find_code_close(bytes, pos + len, len, cx.scans())?;
        Some(Match::new(pos, close + len).with_groups(vec![None, Some((pos + len, close))]))
    }

    fn apply(&self, m: &Match, input: &str, cx: &InlineContext) -> Result<Applied, EngineError> {
        let raw = m.group_str(input, 1).unwrap_or_default();
        let mut code = trim_blank(&raw.replace('\n', " ")).to_string();
        if cx.state().in_table_cell {
            code = code.replace("\\|", "|");
        }
        Ok(Applied::single(
            Token::new(TokenKind::Code { code }, m.span()),
            m.len(),
        ))
    }
}

/// Length of a hard line break at `pos`: two or more spaces (or a
/// backslash) before a newline that is followed by more text
fn line_break_len(bytes: &[u8], pos: usize) -> Option<usize> {
    let marker = match bytes.get(pos)? {
        b'\\' => 1,
        b' ' => {
            let spaces = bytes[pos..].iter().take_while(|&&b| b == b' ').count();
            if spaces < 2 {
                return None;
            }
            spaces
        }
        _ => return None,
    };
    let newline = pos + marker;
    (bytes.get(newline) == Some(&b'\n') && newline + 1 < bytes.len()).then_some(marker + 1)
}

/// Hard line break
#[derive(Debug, Clone, Copy, Default)]
pub struct LineBreak;

impl Rule<InlineContext> for LineBreak {
    fn name(&self) -> &str {
        names::LINE_BREAK
    }

    fn try_match(&self, input: &str, pos: usize, _cx: &InlineContext) -> Option<Match> {
        line_break_len(input.as_bytes(), pos).map(|len| Match::new(pos, pos + len))
    }

    fn apply(&self, m: &Match, _input: &str, _cx: &InlineContext) -> Result<Applied, EngineError> {
        Ok(Applied::single(
            Token::new(TokenKind::LineBreak, m.span()),
            m.len(),
        ))
    }
}

const INLINE_HTML: &str = r#"^(?:<!--(?s:.*?)-->|</[A-Za-z][A-Za-z0-9-]*\s*>|<[A-Za-z][A-Za-z0-9-]*(?:\s+[A-Za-z_:][A-Za-z0-9_.:-]*(?:\s*=\s*(?:[^\s"'=<>`]+|'[^']*'|"[^"]*"))?)*\s*/?>)"#;

/// Start of the first `-->` at or after `from`
fn comment_close(input: &str, from: usize, cx: &InlineContext) -> Option<usize> {
    let scans = cx.scans();
    if let Some(hit) = scans.covering(tables::COMMENT_CLOSE, from) {
        return hit;
    }
    let found = memchr::memmem::find(&input.as_bytes()[from..], b"-->").map(|at| from + at);
    scans.record_range(tables::COMMENT_CLOSE, from, found);
    found
}

/// Inline HTML tag or comment, passed through
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineHtml;

impl Rule<InlineContext> for InlineHtml {
    fn name(&self) -> &str {
        names::HTML
    }

    fn try_match(&self, input: &str, pos: usize, cx: &InlineContext) -> Option<Match> {
        if input.as_bytes().get(pos) != Some(&b'<') {
            return None;
        }
        if input[pos..].starts_with("<!--") && comment_close(input, pos + 4, cx).is_none() {
            return None;
        }
        captures_at(INLINE_HTML, input, pos).map(|caps| Match::from_captures(pos, &caps))
    }

    fn apply(&self, m: &Match, input: &str, _cx: &InlineContext) -> Result<Applied, EngineError> {
        let html = m.as_str(input).to_string();
        Ok(Applied::single(
            Token::new(TokenKind::Html { html }, m.span()),
            m.len(),
        ))
    }
}

/// Inline fallback: a run of literal text
///
/// Always consumes at least one character (a whole backtick run when it
/// starts on one), then stops before the next character some other rule
/// could start on.
#[derive(Debug, Clone, Copy)]
pub struct InlineText {
    gfm: bool,
}

impl InlineText {
    /// Stops before Markdown's special characters
    pub fn markdown() -> Self {
        Self { gfm: false }
    }

    /// Also stops before `~` and bare `http(s)://` URLs
    pub fn gfm() -> Self {
        Self { gfm: true }
    }

    fn end(&self, input: &str, pos: usize) -> usize {
        let bytes = input.as_bytes();
        let mut i = if bytes[pos] == b'`' {
            pos + bytes[pos..].iter().take_while(|&&b| b == b'`').count()
        } else {
            pos + input[pos..].chars().next().map_or(1, char::len_utf8)
        };

        while i < bytes.len() {
            let stop = match bytes[i] {
                b'\\' | b'<' | b'!' | b'[' | b'*' | b'`' => true,
                b'_' => !is_word_byte(bytes[i - 1]),
                b' ' => line_break_len(bytes, i).is_some(),
                b'~' => self.gfm,
                b'h' => {
                    self.gfm
                        && !bytes[i - 1].is_ascii_alphanumeric()
                        && (input[i..].starts_with("http://") || input[i..].starts_with("https://"))
                }
                _ => false,
            };
            if stop {
                break;
            }
            i += 1;
        }
        i
    }
}

impl Rule<InlineContext> for InlineText {
    fn name(&self) -> &str {
        names::TEXT
    }

    fn try_match(&self, input: &str, pos: usize, _cx: &InlineContext) -> Option<Match> {
        (pos < input.len()).then(|| Match::new(pos, self.end(input, pos)))
    }

    fn apply(&self, m: &Match, input: &str, _cx: &InlineContext) -> Result<Applied, EngineError> {
        Ok(Applied::single(
            Token::text(m.as_str(input), m.span()),
            m.len(),
        ))
    }

    fn is_fallback(&self) -> bool {
        true
    }
}
