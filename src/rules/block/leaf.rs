//! Leaf block rules: blank lines, code, headings, rules, HTML, definitions

use crate::engine::context::BlockContext;
use crate::engine::error::EngineError;
use crate::engine::references::MAX_LABEL_LEN;
use crate::engine::regex_cache::captures_at;
use crate::engine::rule::{Applied, Match, Rule};
use crate::engine::scan::{
    is_blank, leading_spaces, line_at, lines_from, run_length, strip_indent, trim_blank,
    trim_blank_end, trim_trailing_blank_lines,
};
use crate::engine::token::{Token, TokenKind};
use crate::rules::{names, unescape};

/// Deepest heading level
pub const MAX_HEADING_LEVEL: u8 = 6;

// ============================================================================
// Blank lines
// ============================================================================

/// Consumes a run of whitespace-only lines
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankLine;

impl Rule<BlockContext> for BlankLine {
    fn name(&self) -> &str {
        names::BLANK_LINE
    }

    fn try_match(&self, input: &str, pos: usize, _cx: &BlockContext) -> Option<Match> {
        let end = lines_from(input, pos)
            .take_while(|line| line.is_blank())
            .last()
            .map(|line| line.end)?;
        Some(Match::new(pos, end))
    }

    fn apply(&self, m: &Match, _input: &str, _cx: &BlockContext) -> Result<Applied, EngineError> {
        Ok(Applied::single(
            Token::new(TokenKind::BlankLine, m.span()),
            m.len(),
        ))
    }
}

// ============================================================================
// Code blocks
// ============================================================================

/// Code block made of lines indented by 4 columns
#[derive(Debug, Clone, Copy, Default)]
pub struct IndentedCode;

impl Rule<BlockContext> for IndentedCode {
    fn name(&self) -> &str {
        names::INDENTED_CODE
    }

    fn try_match(&self, input: &str, pos: usize, _cx: &BlockContext) -> Option<Match> {
        let first = line_at(input, pos)?;
        if first.is_blank() || first.indent() < 4 {
            return None;
        }
        let scanned = lines_from(input, pos)
            .take_while(|line| line.is_blank() || line.indent() >= 4)
            .last()
            .map_or(first.end, |line| line.end);
        Some(Match::new(pos, trim_trailing_blank_lines(input, pos, scanned)))
    }

    fn apply(&self, m: &Match, input: &str, _cx: &BlockContext) -> Result<Applied, EngineError> {
        let text = lines_from(&input[..m.end], m.start)
            .map(|line| strip_indent(line.text, 4))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Applied::single(
            Token::new(TokenKind::CodeBlock { text }, m.span()),
            m.len(),
        ))
    }
}

/// Opening fence of a fenced code block
struct Fence<'a> {
    indent: usize,
    marker: u8,
    len: usize,
    info: &'a str,
}

fn opening_fence(text: &str) -> Option<Fence<'_>> {
    let indent = leading_spaces(text);
    if indent > 3 {
        return None;
    }
    let rest = &text[indent..];
    let marker = *rest.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = run_length(rest, marker);
    if len < 3 {
        return None;
    }
    let info = trim_blank(&rest[len..]);
    if marker == b'`' && info.contains('`') {
        return None;
    }
    Some(Fence {
        indent,
        marker,
        len,
        info,
    })
}

fn is_closing_fence(text: &str, fence: &Fence<'_>) -> bool {
    let indent = leading_spaces(text);
    if indent > 3 {
        return false;
    }
    let rest = &text[indent..];
    let len = run_length(rest, fence.marker);
    len >= fence.len && is_blank(&rest[len..])
}

/// Code block between ``` or ~~~ fences
///
/// Only matches when a closing fence exists; an unclosed fence is left to
/// the paragraph rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct FencedCode;

impl FencedCode {
    fn scan(input: &str, pos: usize) -> Option<usize> {
        let first = line_at(input, pos)?;
        let fence = opening_fence(first.text)?;
        lines_from(input, first.end)
            .find(|line| is_closing_fence(line.text, &fence))
            .map(|line| line.end)
    }
}

impl Rule<BlockContext> for FencedCode {
    fn name(&self) -> &str {
        names::FENCED_CODE
    }

    fn try_match(&self, input: &str, pos: usize, _cx: &BlockContext) -> Option<Match> {
        Self::scan(input, pos).map(|end| Match::new(pos, end))
    }

    fn apply(&self, m: &Match, input: &str, _cx: &BlockContext) -> Result<Applied, EngineError> {
        let mut lines = lines_from(&input[..m.end], m.start);
        let first = lines.next();
        let fence = first.as_ref().and_then(|line| opening_fence(line.text));
        let (indent, info) = fence.as_ref().map_or((0, ""), |f| (f.indent, f.info));

        let mut body: Vec<&str> = lines
            .map(|line| {
                let strip = leading_spaces(line.text).min(indent);
                &line.text[strip..]
            })
            .collect();
        // closing fence
        body.pop();

        let lang = info.split_whitespace().next().map(unescape);
        let token = Token::new(
            TokenKind::FencedCode {
                lang,
                info: info.to_string(),
                text: body.join("\n"),
            },
            m.span(),
        );
        Ok(Applied::single(token, m.len()))
    }

    fn interrupts(&self, input: &str, pos: usize, _cx: &BlockContext) -> bool {
        Self::scan(input, pos).is_some()
    }
}

// ============================================================================
// Headings
// ============================================================================

/// `# Heading` with up to [`MAX_HEADING_LEVEL`] markers
#[derive(Debug, Clone, Copy)]
pub struct AtxHeading {
    require_space: bool,
    max_level: u8,
}

impl AtxHeading {
    /// Classic behavior: no space needed after the markers, runs longer than
    /// the maximum level keep the extra `#` as text
    pub fn markdown() -> Self {
        Self {
            require_space: false,
            max_level: MAX_HEADING_LEVEL,
        }
    }

    /// GitHub behavior: 1 to 6 markers followed by whitespace or end of line
    pub fn gfm() -> Self {
        Self {
            require_space: true,
            max_level: MAX_HEADING_LEVEL,
        }
    }

    fn parse<'a>(&self, text: &'a str) -> Option<(u8, &'a str)> {
        let indent = leading_spaces(text);
        if indent > 3 {
            return None;
        }
        let rest = &text[indent..];
        let run = run_length(rest, b'#');
        if run == 0 {
            return None;
        }
        let max = usize::from(self.max_level);

        let (level, content) = if self.require_space {
            let after = &rest[run..];
            if run > max || !(after.is_empty() || after.starts_with([' ', '\t'])) {
                return None;
            }
            (run, after)
        } else {
            let level = run.min(max);
            (level, &rest[level..])
        };

        Some((level as u8, strip_closing_sequence(trim_blank(content))))
    }
}

/// Drop a closing `#` run that is separated from the text by whitespace
fn strip_closing_sequence(content: &str) -> &str {
    let without = content.trim_end_matches('#');
    if without.is_empty() {
        ""
    } else if without.len() < content.len() && without.ends_with([' ', '\t']) {
        trim_blank_end(without)
    } else {
        content
    }
}

impl Rule<BlockContext> for AtxHeading {
    fn name(&self) -> &str {
        names::HEADING
    }

    fn try_match(&self, input: &str, pos: usize, _cx: &BlockContext) -> Option<Match> {
        let line = line_at(input, pos)?;
        self.parse(line.text)?;
        Some(Match::new(pos, line.end))
    }

    fn apply(&self, m: &Match, input: &str, _cx: &BlockContext) -> Result<Applied, EngineError> {
        let line = &input[m.start..m.end];
        let line = line.trim_end_matches(['\n', '\r']);
        let (level, content) = self.parse(line).unwrap_or((1, ""));
        let token = Token::deferred(
            TokenKind::Heading {
                level,
                setext: false,
            },
            m.span(),
            content.to_string(),
        );
        Ok(Applied::single(token, m.len()))
    }

    fn interrupts(&self, input: &str, pos: usize, _cx: &BlockContext) -> bool {
        line_at(input, pos).is_some_and(|line| self.parse(line.text).is_some())
    }
}

/// Level of a Setext underline (`===` is 1, `---` is 2)
fn setext_underline(text: &str) -> Option<u8> {
    let indent = leading_spaces(text);
    if indent > 3 {
        return None;
    }
    let rest = trim_blank_end(&text[indent..]);
    let marker = *rest.as_bytes().first()?;
    let level = match marker {
        b'=' => 1,
        b'-' => 2,
        _ => return None,
    };
    (rest.len() >= 2 && run_length(rest, marker) == rest.len()).then_some(level)
}

/// A line of text underlined with `=` or `-`; top-level scopes only
#[derive(Debug, Clone, Copy, Default)]
pub struct SetextHeading;

impl SetextHeading {
    fn scan(input: &str, pos: usize, cx: &BlockContext) -> Option<(usize, u8)> {
        if !cx.state().top_level {
            return None;
        }
        let text = line_at(input, pos)?;
        if text.is_blank() || text.indent() >= 4 {
            return None;
        }
        let underline = line_at(input, text.end)?;
        let level = setext_underline(underline.text)?;
        Some((underline.end, level))
    }
}

impl Rule<BlockContext> for SetextHeading {
    fn name(&self) -> &str {
        names::SETEXT_HEADING
    }

    fn try_match(&self, input: &str, pos: usize, cx: &BlockContext) -> Option<Match> {
        Self::scan(input, pos, cx).map(|(end, _)| Match::new(pos, end))
    }

    fn apply(&self, m: &Match, input: &str, cx: &BlockContext) -> Result<Applied, EngineError> {
        let level = Self::scan(input, m.start, cx).map_or(1, |(_, level)| level);
        let content = line_at(input, m.start).map_or("", |line| trim_blank(line.text));
        let token = Token::deferred(
            TokenKind::Heading {
                level,
                setext: true,
            },
            m.span(),
            content.to_string(),
        );
        Ok(Applied::single(token, m.len()))
    }

    fn interrupts(&self, input: &str, pos: usize, cx: &BlockContext) -> bool {
        Self::scan(input, pos, cx).is_some()
    }
}

// ============================================================================
// Thematic breaks
// ============================================================================

/// Whether a line is 3+ of the same `*`, `-` or `_`, optionally spaced
pub(crate) fn is_horizontal_rule(text: &str) -> bool {
    if leading_spaces(text) > 3 {
        return false;
    }
    let mut marker = None;
    let mut count = 0;
    for b in text.bytes() {
        match b {
            b' ' | b'\t' => {}
            b'*' | b'-' | b'_' if marker.is_none() || marker == Some(b) => {
                marker = Some(b);
                count += 1;
            }
            _ => return false,
        }
    }
    count >= 3
}

/// Thematic break (`***`, `- - -`, `___`)
#[derive(Debug, Clone, Copy, Default)]
pub struct HorizontalRule;

impl Rule<BlockContext> for HorizontalRule {
    fn name(&self) -> &str {
        names::HORIZONTAL_RULE
    }

    fn try_match(&self, input: &str, pos: usize, _cx: &BlockContext) -> Option<Match> {
        let line = line_at(input, pos)?;
        is_horizontal_rule(line.text).then(|| Match::new(pos, line.end))
    }

    fn apply(&self, m: &Match, _input: &str, _cx: &BlockContext) -> Result<Applied, EngineError> {
        Ok(Applied::single(
            Token::new(TokenKind::HorizontalRule, m.span()),
            m.len(),
        ))
    }

    fn interrupts(&self, input: &str, pos: usize, _cx: &BlockContext) -> bool {
        line_at(input, pos).is_some_and(|line| is_horizontal_rule(line.text))
    }
}

// ============================================================================
// HTML blocks
// ============================================================================

const HTML_BLOCK_TAG: &str = r"^ {0,3}</?([A-Za-z][A-Za-z0-9-]*)(?:[ \t/>]|$)";

/// Tags that start inline HTML rather than an HTML block
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "del", "dfn", "em", "i", "img",
    "ins", "kbd", "mark", "q", "rp", "rt", "ruby", "s", "samp", "small", "span", "strong", "sub",
    "sup", "time", "u", "var", "wbr",
];

enum HtmlStart {
    Comment,
    Tag,
}

fn html_block_start(text: &str) -> Option<HtmlStart> {
    let indent = leading_spaces(text);
    if indent > 3 {
        return None;
    }
    if text[indent..].starts_with("<!--") {
        return Some(HtmlStart::Comment);
    }
    let caps = captures_at(HTML_BLOCK_TAG, text, 0)?;
    let tag = caps.get(1)?.as_str().to_ascii_lowercase();
    (!INLINE_TAGS.contains(&tag.as_str())).then_some(HtmlStart::Tag)
}

/// Raw HTML passed through up to the next blank line (or the end of a
/// comment)
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlBlock;

impl HtmlBlock {
    fn scan(input: &str, pos: usize) -> Option<usize> {
        let first = line_at(input, pos)?;
        let start = html_block_start(first.text)?;

        if let HtmlStart::Comment = start {
            let open = pos + first.text.find("<!--").map_or(0, |at| at + 4);
            if let Some(close) = input[open..].find("-->") {
                let close = open + close;
                return lines_from(input, pos)
                    .find(|line| line.end > close)
                    .map(|line| line.end);
            }
        }

        let end = lines_from(input, pos)
            .take_while(|line| !line.is_blank())
            .last()
            .map_or(first.end, |line| line.end);
        Some(end)
    }
}

impl Rule<BlockContext> for HtmlBlock {
    fn name(&self) -> &str {
        names::HTML_BLOCK
    }

    fn try_match(&self, input: &str, pos: usize, _cx: &BlockContext) -> Option<Match> {
        Self::scan(input, pos).map(|end| Match::new(pos, end))
    }

    fn apply(&self, m: &Match, input: &str, _cx: &BlockContext) -> Result<Applied, EngineError> {
        let html = m.as_str(input).trim_end_matches(['\n', '\r']).to_string();
        Ok(Applied::single(
            Token::new(TokenKind::HtmlBlock { html }, m.span()),
            m.len(),
        ))
    }

    fn interrupts(&self, input: &str, pos: usize, _cx: &BlockContext) -> bool {
        line_at(input, pos).is_some_and(|line| html_block_start(line.text).is_some())
    }
}

// ============================================================================
// Link-reference definitions
// ============================================================================

const LINK_DEFINITION: &str = r#"^ {0,3}\[((?:[^\[\]\\\n]|\\.)+)\]:[ \t]*(?:\r?\n[ \t]*)?(<[^<>\n]*>|[^\s<>]+)(?:(?:[ \t]+|[ \t]*\r?\n[ \t]*)("(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'|\((?:[^()\\\n]|\\.)*\)))?[ \t]*(?:\r?\n|$)"#;

/// `[label]: url "title"`; top-level scopes outside blockquotes only
///
/// The definition itself renders to nothing; it feeds the reference table
/// consulted by reference-style links.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkDefinition;

impl LinkDefinition {
    fn allowed(cx: &BlockContext) -> bool {
        cx.state().top_level && cx.state().quote_depth == 0
    }
}

impl Rule<BlockContext> for LinkDefinition {
    fn name(&self) -> &str {
        names::LINK_DEFINITION
    }

    fn try_match(&self, input: &str, pos: usize, cx: &BlockContext) -> Option<Match> {
        if !Self::allowed(cx) {
            return None;
        }
        let caps = captures_at(LINK_DEFINITION, input, pos)?;
        let label = caps.get(1)?.as_str();
        if label.len() > MAX_LABEL_LEN || label.trim().is_empty() {
            return None;
        }
        Some(Match::from_captures(pos, &caps))
    }

    fn apply(&self, m: &Match, input: &str, _cx: &BlockContext) -> Result<Applied, EngineError> {
        let label = m.group_str(input, 1).unwrap_or_default().to_string();
        let raw_url = m.group_str(input, 2).unwrap_or_default();
        let url = raw_url
            .strip_prefix('<')
            .and_then(|u| u.strip_suffix('>'))
            .unwrap_or(raw_url);
        let title = m
            .group_str(input, 3)
            .filter(|t| t.len() >= 2)
            .map(|t| unescape(&t[1..t.len() - 1]));

        let token = Token::new(
            TokenKind::LinkDefinition {
                label,
                url: unescape(url),
                title,
            },
            m.span(),
        );
        Ok(Applied::single(token, m.len()))
    }

    fn interrupts(&self, input: &str, pos: usize, cx: &BlockContext) -> bool {
        self.try_match(input, pos, cx).is_some()
    }
}
