//! Links, images and autolinks
//!
//! Link text is parsed with a nested context that has `in_link` set, so
//! links never nest. Images keep their bracket text unparsed as `alt`.
//!
//! Bracket, parenthesis and title scans go through the run's scan cache:
//! each `[` is matched once per run however many rules ask about it.

use crate::engine::context::InlineContext;
use crate::engine::error::EngineError;
use crate::engine::references::{LinkTarget, MAX_LABEL_LEN};
use crate::engine::regex_cache::captures_at;
use crate::engine::rule::{Applied, Match, Rule};
use crate::engine::scan_cache::ScanCache;
use crate::engine::source_location::Span;
use crate::engine::token::{Token, TokenKind};
use crate::rules::inline::{skip_code, tables};
use crate::rules::{names, unescape};

// ============================================================================
// Shared scanning
// ============================================================================

/// Offset of the `]` matching the `[` at `open`
///
/// Escaped brackets and brackets inside code spans do not count. Every `[`
/// passed on the way is matched as well.
fn closing_bracket(bytes: &[u8], open: usize, scans: &ScanCache) -> Option<usize> {
    if let Some(hit) = scans.get(tables::BRACKETS, open) {
        return hit;
    }
    let mut pending = vec![open];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'`' => {
                i = skip_code(bytes, i, scans);
                continue;
            }
            b'[' => match scans.get(tables::BRACKETS, i) {
                Some(Some(close)) => {
                    i = close + 1;
                    continue;
                }
                Some(None) => break,
                None => pending.push(i),
            },
            b']' => {
                if let Some(inner) = pending.pop() {
                    scans.insert(tables::BRACKETS, inner, Some(i));
                }
                if pending.is_empty() {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    scans.insert_all(tables::BRACKETS, &pending, None);
    None
}

/// Offset of the `)` matching the `(` at `open` in a link destination
///
/// A destination ends at whitespace, so a `(` still open there is unmatched.
fn closing_paren(bytes: &[u8], open: usize, scans: &ScanCache) -> Option<usize> {
    if let Some(hit) = scans.get(tables::PARENS, open) {
        return hit;
    }
    let mut pending = vec![open];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'(' => match scans.get(tables::PARENS, i) {
                Some(Some(close)) => {
                    i = close + 1;
                    continue;
                }
                Some(None) => break,
                None => pending.push(i),
            },
            b')' => {
                if let Some(inner) = pending.pop() {
                    scans.insert(tables::PARENS, inner, Some(i));
                }
                if pending.is_empty() {
                    return Some(i);
                }
            }
            b if b <= b' ' => break,
            _ => {}
        }
        i += 1;
    }
    scans.insert_all(tables::PARENS, &pending, None);
    None
}

/// Offset of the first unescaped `close` at or after `start`
fn title_end(bytes: &[u8], start: usize, close: u8, scans: &ScanCache) -> Option<usize> {
    let table = tables::title_close(close);
    if let Some(hit) = scans.covering(table, start) {
        return hit;
    }
    let mut found = None;
    let mut j = start;
    while j < bytes.len() {
        if bytes[j] == close {
            found = Some(j);
            break;
        }
        j += if bytes[j] == b'\\' { 2 } else { 1 };
    }
    scans.record_range(table, start, found);
    found
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\n') {
        i += 1;
    }
    i
}

/// `(url "title")` part of an inline link
struct InlineTarget {
    end: usize,
    url: (usize, usize),
    title: Option<(usize, usize)>,
}

fn inline_target(bytes: &[u8], paren: usize, scans: &ScanCache) -> Option<InlineTarget> {
    let len = bytes.len();
    let mut i = skip_whitespace(bytes, paren + 1);

    let url = if bytes.get(i) == Some(&b'<') {
        let start = i + 1;
        let mut j = start;
        while j < len && bytes[j] != b'>' {
            match bytes[j] {
                b'\n' | b'<' => return None,
                b'\\' => j += 2,
                _ => j += 1,
            }
        }
        if j >= len {
            return None;
        }
        i = j + 1;
        (start, j)
    } else {
        let start = i;
        while i < len {
            match bytes[i] {
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'(' => {
                    i = closing_paren(bytes, i, scans)? + 1;
                    continue;
                }
                b')' => break,
                b if b <= b' ' => break,
                _ => {}
            }
            i += 1;
        }
        i = i.min(len);
        (start, i)
    };

    let before = i;
    i = skip_whitespace(bytes, i);

    let mut title = None;
    if i > before {
        if let Some(&quote) = bytes.get(i) {
            if matches!(quote, b'"' | b'\'' | b'(') {
                let close = if quote == b'(' { b')' } else { quote };
                let start = i + 1;
                let j = title_end(bytes, start, close, scans)?;
                title = Some((start, j));
                i = skip_whitespace(bytes, j + 1);
            }
        }
    }

    (bytes.get(i) == Some(&b')')).then_some(InlineTarget {
        end: i + 1,
        url,
        title,
    })
}

/// Build a link or image token for a match whose group 1 is the bracket text
fn link_token(
    m: &Match,
    input: &str,
    cx: &InlineContext,
    url: String,
    title: Option<String>,
) -> Result<Applied, EngineError> {
    let text = m.group_str(input, 1).unwrap_or_default();

    if input.as_bytes().get(m.start) == Some(&b'!') {
        let token = Token::new(
            TokenKind::Image {
                url,
                title,
                alt: text.to_string(),
            },
            m.span(),
        );
        return Ok(Applied::single(token, m.len()));
    }

    let children = match cx.nested() {
        Some(inner) => inner.derive(|s| s.in_link = true).parse(text)?,
        None => vec![Token::text(text, Span::new(0, text.len()))],
    };
    Ok(Applied::single(
        Token::with_children(TokenKind::Link { url, title }, m.span(), children),
        m.len(),
    ))
}

/// Position of the opening `[` if a link or image may start at `pos`
fn bracket_start(input: &str, pos: usize, cx: &InlineContext) -> Option<usize> {
    let bytes = input.as_bytes();
    match bytes.get(pos)? {
        b'!' if bytes.get(pos + 1) == Some(&b'[') => Some(pos + 1),
        b'[' if !cx.state().in_link && cx.state().can_nest() => Some(pos),
        _ => None,
    }
}

// ============================================================================
// Inline links
// ============================================================================

/// `[text](url "title")` and `![alt](src "title")`
#[derive(Debug, Clone, Copy, Default)]
pub struct Link;

impl Rule<InlineContext> for Link {
    fn name(&self) -> &str {
        names::LINK
    }

    fn try_match(&self, input: &str, pos: usize, cx: &InlineContext) -> Option<Match> {
        let open = bracket_start(input, pos, cx)?;
        let bytes = input.as_bytes();
        let close = closing_bracket(bytes, open, cx.scans())?;
        if bytes.get(close + 1) != Some(&b'(') {
            return None;
        }
        let target = inline_target(bytes, close + 1, cx.scans())?;
        Some(Match::new(pos, target.end).with_groups(vec![
            None,
            Some((open + 1, close)),
            Some(target.url),
            target.title,
        ]))
    }

    fn apply(&self, m: &Match, input: &str, cx: &InlineContext) -> Result<Applied, EngineError> {
        let url = unescape(m.group_str(input, 2).unwrap_or_default());
        let title = m.group_str(input, 3).map(unescape);
        link_token(m, input, cx, url, title)
    }
}

// ============================================================================
// Reference links
// ============================================================================

fn resolved(cx: &InlineContext, label: &str) -> Option<LinkTarget> {
    if label.len() > MAX_LABEL_LEN || cx.references().is_empty() {
        return None;
    }
    cx.references().get(label).cloned()
}

/// `[text][label]` (or `[text][]`, using the text as label), resolved
/// against the document's definitions
#[derive(Debug, Clone, Copy, Default)]
pub struct RefLink;

impl RefLink {
    fn scan(input: &str, pos: usize, cx: &InlineContext) -> Option<(Match, LinkTarget)> {
        let open = bracket_start(input, pos, cx)?;
        let bytes = input.as_bytes();
        let close = closing_bracket(bytes, open, cx.scans())?;
        if bytes.get(close + 1) != Some(&b'[') {
            return None;
        }
        let label_start = close + 2;
        let label_len = input[label_start..].find([']', '['])?;
        let label_end = label_start + label_len;
        if bytes[label_end] != b']' {
            return None;
        }

        let label = if input[label_start..label_end].trim().is_empty() {
            &input[open + 1..close]
        } else {
            &input[label_start..label_end]
        };
        let target = resolved(cx, label)?;
        let m = Match::new(pos, label_end + 1).with_groups(vec![None, Some((open + 1, close))]);
        Some((m, target))
    }
}

impl Rule<InlineContext> for RefLink {
    fn name(&self) -> &str {
        names::REF_LINK
    }

    fn try_match(&self, input: &str, pos: usize, cx: &InlineContext) -> Option<Match> {
        Self::scan(input, pos, cx).map(|(m, _)| m)
    }

    fn apply(&self, m: &Match, input: &str, cx: &InlineContext) -> Result<Applied, EngineError> {
        let target = Self::scan(input, m.start, cx).map(|(_, t)| t);
        let (url, title) = target.map_or((String::new(), None), |t| (t.url, t.title));
        link_token(m, input, cx, url, title)
    }
}

/// `[label]` shortcut reference, resolved against the document's
/// definitions
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLink;

impl NoLink {
    fn scan(input: &str, pos: usize, cx: &InlineContext) -> Option<(Match, LinkTarget)> {
        let open = bracket_start(input, pos, cx)?;
        let close = closing_bracket(input.as_bytes(), open, cx.scans())?;
        let label = &input[open + 1..close];
        if label.trim().is_empty() {
            return None;
        }
        let target = resolved(cx, label)?;
        let m = Match::new(pos, close + 1).with_groups(vec![None, Some((open + 1, close))]);
        Some((m, target))
    }
}

impl Rule<InlineContext> for NoLink {
    fn name(&self) -> &str {
        names::NO_LINK
    }

    fn try_match(&self, input: &str, pos: usize, cx: &InlineContext) -> Option<Match> {
        Self::scan(input, pos, cx).map(|(m, _)| m)
    }

    fn apply(&self, m: &Match, input: &str, cx: &InlineContext) -> Result<Applied, EngineError> {
        let target = Self::scan(input, m.start, cx).map(|(_, t)| t);
        let (url, title) = target.map_or((String::new(), None), |t| (t.url, t.title));
        link_token(m, input, cx, url, title)
    }
}

// ============================================================================
// Autolinks
// ============================================================================

const AUTOLINK_URI: &str = r"^<([A-Za-z][A-Za-z0-9+.-]{1,31}:[^\s<>]*)>";
const AUTOLINK_EMAIL: &str = r"^<([A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*)>";

/// A link whose text is its destination
fn self_link(m: &Match, text: &str, url: String) -> Applied {
    let child = Token::text(text, Span::new(0, text.len()));
    Applied::single(
        Token::with_children(TokenKind::Link { url, title: None }, m.span(), vec![child]),
        m.len(),
    )
}

/// `<scheme:...>` and `<user@host>`; emails get a `mailto:` destination
#[derive(Debug, Clone, Copy, Default)]
pub struct Autolink;

impl Rule<InlineContext> for Autolink {
    fn name(&self) -> &str {
        names::AUTOLINK
    }

    fn try_match(&self, input: &str, pos: usize, cx: &InlineContext) -> Option<Match> {
        if cx.state().in_link || input.as_bytes().get(pos) != Some(&b'<') {
            return None;
        }
        if let Some(caps) = captures_at(AUTOLINK_URI, input, pos) {
            return Some(Match::from_captures(pos, &caps));
        }
        let caps = captures_at(AUTOLINK_EMAIL, input, pos)?;
        let m = Match::from_captures(pos, &caps);
        let email = m.group(1);
        Some(m.with_groups(vec![None, None, email]))
    }

    fn apply(&self, m: &Match, input: &str, _cx: &InlineContext) -> Result<Applied, EngineError> {
        if let Some(uri) = m.group_str(input, 1) {
            return Ok(self_link(m, uri, uri.to_string()));
        }
        let email = m.group_str(input, 2).unwrap_or_default();
        Ok(self_link(m, email, format!("mailto:{}", email)))
    }
}

const BARE_URL: &str = r"^https?://[^\s<]+";

/// Bare `http://` and `https://` URLs
///
/// Trailing punctuation and unbalanced closing parentheses are left out of
/// the link.
#[derive(Debug, Clone, Copy, Default)]
pub struct Url;

impl Rule<InlineContext> for Url {
    fn name(&self) -> &str {
        names::URL
    }

    fn try_match(&self, input: &str, pos: usize, cx: &InlineContext) -> Option<Match> {
        if cx.state().in_link || input.as_bytes().get(pos) != Some(&b'h') {
            return None;
        }
        let caps = captures_at(BARE_URL, input, pos)?;
        let mut end = pos + caps.get(0)?.end();
        let bytes = input.as_bytes();
        let opens = memchr::memchr_iter(b'(', &bytes[pos..end]).count();
        let mut closes = memchr::memchr_iter(b')', &bytes[pos..end]).count();

        while end > pos {
            let last = bytes[end - 1];
            let unbalanced = last == b')' && opens < closes;
            if b"?!.,:*_~'\"".contains(&last) || unbalanced {
                end -= 1;
                if last == b')' {
                    closes -= 1;
                }
            } else {
                break;
            }
        }

        let scheme = input[pos..].find("://").map_or(0, |at| at + 3);
        (end > pos + scheme).then(|| Match::new(pos, end))
    }

    fn apply(&self, m: &Match, input: &str, _cx: &InlineContext) -> Result<Applied, EngineError> {
        let url = m.as_str(input);
        Ok(self_link(m, url, url.to_string()))
    }
}
