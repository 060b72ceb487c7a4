//! Container rules: blockquotes and lists
//!
//! Both strip their markers, then run the block engine again on the
//! stripped body with a derived context. Both refuse to match once the
//! context's nesting limit is reached, so deeper markers fall through to
//! the text rules.

use crate::engine::context::BlockContext;
use crate::engine::error::EngineError;
use crate::engine::rule::{Applied, Match, Rule};
use crate::engine::scan::{
    indent_width, is_blank, leading_spaces, line_at, lines_from, strip_indent, trim_blank_start,
    Line,
};
use crate::engine::source_location::Span;
use crate::engine::token::{Token, TokenKind};
use crate::rules::block::leaf::is_horizontal_rule;
use crate::rules::names;

// ============================================================================
// Blockquote
// ============================================================================

/// Content of a `>` line, with the marker and one following space removed
fn quote_content(text: &str) -> Option<&str> {
    let indent = leading_spaces(text);
    if indent > 3 {
        return None;
    }
    let after = text[indent..].strip_prefix('>')?;
    Some(after.strip_prefix(' ').unwrap_or(after))
}

/// `>`-prefixed lines, parsed recursively as blocks
///
/// Blank lines stay inside the quote only when another `>` line follows.
/// A plain line directly after quoted text continues it lazily unless it
/// starts another block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blockquote;

impl Blockquote {
    fn scan(input: &str, pos: usize, cx: &BlockContext) -> Option<(usize, String)> {
        if !cx.state().can_nest() {
            return None;
        }
        let first = line_at(input, pos)?;
        let content = quote_content(first.text)?;

        let mut body = vec![content];
        let mut end = first.end;
        let mut pending_blanks = 0;
        let mut last_blank = is_blank(content);

        for line in lines_from(input, first.end) {
            if let Some(content) = quote_content(line.text) {
                body.extend(std::iter::repeat("").take(pending_blanks));
                pending_blanks = 0;
                body.push(content);
                last_blank = is_blank(content);
                end = line.end;
            } else if line.is_blank() {
                pending_blanks += 1;
            } else if pending_blanks == 0 && !last_blank && !cx.interrupts_at(input, line.start) {
                body.push(line.text);
                end = line.end;
            } else {
                break;
            }
        }

        Some((end, body.join("\n")))
    }
}

impl Rule<BlockContext> for Blockquote {
    fn name(&self) -> &str {
        names::BLOCKQUOTE
    }

    fn try_match(&self, input: &str, pos: usize, cx: &BlockContext) -> Option<Match> {
        let matched = Self::scan(input, pos, cx).map(|(end, _)| Match::new(pos, end));
        if matched.is_none() && !cx.state().can_nest() {
            log_debug!(
                "blockquote at byte {} flattened: nesting limit {} reached",
                pos,
                cx.state().max_nesting
            );
        }
        matched
    }

    fn apply(&self, m: &Match, input: &str, cx: &BlockContext) -> Result<Applied, EngineError> {
        let body = Self::scan(input, m.start, cx).map_or_else(String::new, |(_, body)| body);
        let inner = cx.derive(|s| {
            s.quote_depth += 1;
            s.top_level = true;
        });
        let children = inner.parse(&body)?;
        Ok(Applied::single(
            Token::with_children(TokenKind::Blockquote, m.span(), children),
            m.len(),
        ))
    }

    fn interrupts(&self, input: &str, pos: usize, cx: &BlockContext) -> bool {
        cx.state().can_nest() && line_at(input, pos).is_some_and(|l| quote_content(l.text).is_some())
    }
}

// ============================================================================
// List
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    Bullet(u8),
    Ordered(u8),
}

/// A list item marker at the start of a line
#[derive(Debug, Clone, Copy)]
struct Marker {
    kind: MarkerKind,
    number: Option<u64>,
    /// Column where item content starts; continuation lines need this indent
    content_col: usize,
    /// Byte offset of the content in the marker line
    content_start: usize,
    /// No content on the marker line
    empty: bool,
}

fn parse_marker(text: &str) -> Option<Marker> {
    let indent = leading_spaces(text);
    if indent > 3 || is_horizontal_rule(text) {
        return None;
    }
    let rest = &text[indent..];
    let bytes = rest.as_bytes();

    let (kind, number, width) = match *bytes.first()? {
        b @ (b'*' | b'+' | b'-') => (MarkerKind::Bullet(b), None, 1),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            let delim = *bytes.get(digits)?;
            if digits > 9 || !(delim == b'.' || delim == b')') {
                return None;
            }
            let number = rest[..digits].parse().ok()?;
            (MarkerKind::Ordered(delim), Some(number), digits + 1)
        }
        _ => return None,
    };

    let after = &rest[width..];
    let marker_end = indent + width;
    if is_blank(after) {
        return Some(Marker {
            kind,
            number,
            content_col: marker_end + 1,
            content_start: text.len(),
            empty: true,
        });
    }
    if !after.starts_with([' ', '\t']) {
        return None;
    }

    let spacing = indent_width(after);
    let ws_bytes = after.len() - after.trim_start_matches([' ', '\t']).len();
    let (content_col, content_start) = if spacing > 4 {
        // indented code inside the item: only one space belongs to the marker
        (marker_end + 1, marker_end + 1)
    } else {
        (marker_end + spacing, marker_end + ws_bytes)
    };

    Some(Marker {
        kind,
        number,
        content_col,
        content_start,
        empty: false,
    })
}

/// One item found while scanning a list
struct ItemScan<'a> {
    start: usize,
    end: usize,
    content_col: usize,
    lines: Vec<&'a str>,
}

impl<'a> ItemScan<'a> {
    fn open(line: &Line<'a>, marker: &Marker) -> Self {
        Self {
            start: line.start,
            end: line.end,
            content_col: marker.content_col,
            lines: vec![&line.text[marker.content_start..]],
        }
    }

    fn last_line_blank(&self) -> bool {
        self.lines.last().map_or(true, |l| is_blank(l))
    }
}

/// Result of scanning a list
struct ListScan<'a> {
    end: usize,
    first: Marker,
    items: Vec<ItemScan<'a>>,
    blank_between_items: bool,
}

/// Bullet (`-`, `+`, `*`) or ordered (`1.`, `1)`) list
///
/// Items continue on lines indented to their content column and on lazy
/// lines; a line with the same kind of marker at a smaller indent starts the
/// next item. Item bodies are parsed as non-top-level block scopes.
#[derive(Debug, Clone, Copy)]
pub struct List {
    interrupts_paragraph: bool,
}

impl List {
    /// Classic behavior: a list cannot interrupt a top-level paragraph
    pub fn markdown() -> Self {
        Self {
            interrupts_paragraph: false,
        }
    }

    /// GitHub behavior: a bullet or a list starting at 1 interrupts a
    /// paragraph
    pub fn gfm() -> Self {
        Self {
            interrupts_paragraph: true,
        }
    }

    fn scan<'a>(input: &'a str, pos: usize, cx: &BlockContext) -> Option<ListScan<'a>> {
        if !cx.state().can_nest() {
            return None;
        }
        let first_line = line_at(input, pos)?;
        let first = parse_marker(first_line.text)?;

        let mut items = Vec::new();
        let mut current = ItemScan::open(&first_line, &first);
        let mut end = first_line.end;
        let mut pending: Vec<Line<'a>> = Vec::new();
        let mut blank_between_items = false;

        for line in lines_from(input, first_line.end) {
            if line.is_blank() {
                pending.push(line);
                continue;
            }

            if line.indent() >= current.content_col {
                current.lines.extend(pending.drain(..).map(|_| ""));
                current.lines.push(strip_indent(line.text, current.content_col));
                current.end = line.end;
                end = line.end;
                continue;
            }

            if let Some(marker) = parse_marker(line.text) {
                if marker.kind != first.kind {
                    break;
                }
                if !pending.is_empty() {
                    blank_between_items = true;
                    pending.clear();
                }
                current.end = line.start;
                items.push(std::mem::replace(&mut current, ItemScan::open(&line, &marker)));
                end = line.end;
                continue;
            }

            if pending.is_empty() && !current.last_line_blank() && !cx.interrupts_at(input, line.start)
            {
                current.lines.push(trim_blank_start(line.text));
                current.end = line.end;
                end = line.end;
                continue;
            }
            break;
        }
        items.push(current);

        Some(ListScan {
            end,
            first,
            items,
            blank_between_items,
        })
    }
}

/// Whether blank lines separate the blocks of an item
fn has_inner_blank(children: &[Token]) -> bool {
    let len = children.len();
    children
        .iter()
        .enumerate()
        .any(|(i, t)| matches!(t.kind, TokenKind::BlankLine) && i > 0 && i + 1 < len)
}

impl Rule<BlockContext> for List {
    fn name(&self) -> &str {
        names::LIST
    }

    fn try_match(&self, input: &str, pos: usize, cx: &BlockContext) -> Option<Match> {
        Self::scan(input, pos, cx).map(|scan| Match::new(pos, scan.end))
    }

    fn apply(&self, m: &Match, input: &str, cx: &BlockContext) -> Result<Applied, EngineError> {
        let Some(scan) = Self::scan(input, m.start, cx) else {
            return Ok(Applied::single(
                Token::deferred(TokenKind::Plain, m.span(), m.as_str(input).to_string()),
                m.len(),
            ));
        };

        let inner = cx.derive(|s| {
            s.list_depth += 1;
            s.top_level = false;
        });

        let mut loose = scan.blank_between_items;
        let mut items = Vec::with_capacity(scan.items.len());
        for (index, item) in scan.items.iter().enumerate() {
            let body = item.lines.join("\n");
            let children = inner.parse(&body)?;
            loose |= has_inner_blank(&children);
            items.push(Token::with_children(
                TokenKind::ListItem { index },
                Span::new(item.start, item.end),
                children,
            ));
        }

        let ordered = matches!(scan.first.kind, MarkerKind::Ordered(_));
        let token = Token::with_children(
            TokenKind::List {
                ordered,
                start: scan.first.number,
                loose,
            },
            m.span(),
            items,
        );
        Ok(Applied::single(token, m.len()))
    }

    fn interrupts(&self, input: &str, pos: usize, cx: &BlockContext) -> bool {
        let state = cx.state();
        if !state.can_nest() || (state.top_level && !self.interrupts_paragraph) {
            return false;
        }
        let Some(marker) = line_at(input, pos).and_then(|l| parse_marker(l.text)) else {
            return false;
        };
        if !state.top_level {
            return true;
        }
        !marker.empty && marker.number.map_or(true, |n| n == 1)
    }
}
