//! Pipe tables
//!
//! ```text
//! | Name | Value |
//! |:-----|------:|
//! | a    |     1 |
//! ```
//!
//! The separator row disambiguates a table from a paragraph that happens to
//! contain pipes: it must have exactly as many cells as the header row.

use crate::engine::context::BlockContext;
use crate::engine::error::EngineError;
use crate::engine::rule::{Applied, Match, Rule};
use crate::engine::scan::{
    line_at, lines_from, trim_blank, trim_blank_end, trim_blank_start, Line,
};
use crate::engine::source_location::Span;
use crate::engine::token::{Alignment, Token, TokenKind};
use crate::rules::names;

/// Byte ranges of the cells of a row, relative to the row text
///
/// Outer pipes are optional; `\|` does not split.
fn split_row(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut start = text.len() - trim_blank_start(text).len();
    let mut end = trim_blank_end(text).len();

    if start < end && bytes[start] == b'|' {
        start += 1;
    }
    if end > start && bytes[end - 1] == b'|' && !(end >= start + 2 && bytes[end - 2] == b'\\') {
        end -= 1;
    }

    let mut cells = Vec::new();
    let mut cell_start = start;
    let mut i = start;
    while i < end {
        match bytes[i] {
            b'\\' => i += 2,
            b'|' => {
                cells.push(trim_range(text, cell_start, i));
                i += 1;
                cell_start = i;
            }
            _ => i += 1,
        }
    }
    cells.push(trim_range(text, cell_start, end.max(cell_start)));
    cells
}

fn trim_range(text: &str, start: usize, end: usize) -> (usize, usize) {
    let end = end.min(text.len());
    let slice = &text[start..end];
    let lead = slice.len() - trim_blank_start(slice).len();
    let trimmed = trim_blank(slice);
    (start + lead, start + lead + trimmed.len())
}

/// Alignment of a separator cell, or `None` if the cell is not `:?-+:?`
fn separator_alignment(cell: &str) -> Option<Alignment> {
    let left = cell.starts_with(':');
    let right = cell.ends_with(':') && cell.len() > 1;
    let dashes = &cell[usize::from(left)..cell.len() - usize::from(right)];
    if dashes.is_empty() || !dashes.bytes().all(|b| b == b'-') {
        return None;
    }
    Some(match (left, right) {
        (true, true) => Alignment::Center,
        (true, false) => Alignment::Left,
        (false, true) => Alignment::Right,
        (false, false) => Alignment::None,
    })
}

struct TableScan<'a> {
    header: Line<'a>,
    alignments: Vec<Alignment>,
    rows: Vec<Line<'a>>,
    end: usize,
}

/// Pipe table with a header row and an alignment row
#[derive(Debug, Clone, Copy, Default)]
pub struct Table;

impl Table {
    fn scan<'a>(input: &'a str, pos: usize, cx: &BlockContext) -> Option<TableScan<'a>> {
        let header = line_at(input, pos)?;
        if header.indent() >= 4 || !header.text.contains('|') {
            return None;
        }
        let separator = line_at(input, header.end)?;
        if separator.indent() >= 4 || !separator.text.contains('|') {
            return None;
        }

        let header_cells = split_row(header.text);
        let alignments = split_row(separator.text)
            .into_iter()
            .map(|(s, e)| separator_alignment(&separator.text[s..e]))
            .collect::<Option<Vec<_>>>()?;
        if alignments.len() != header_cells.len() {
            return None;
        }

        let mut end = separator.end;
        let mut rows = Vec::new();
        for line in lines_from(input, separator.end) {
            if line.is_blank() || !line.text.contains('|') || cx.interrupts_at(input, line.start) {
                break;
            }
            end = line.end;
            rows.push(line);
        }

        Some(TableScan {
            header,
            alignments,
            rows,
            end,
        })
    }

    fn row(line: &Line<'_>, header: bool, alignments: &[Alignment]) -> Token {
        let ranges = split_row(line.text);
        let row_end = line.start + line.text.len();
        let cells = alignments
            .iter()
            .enumerate()
            .map(|(i, &alignment)| {
                let kind = TokenKind::TableCell { alignment };
                match ranges.get(i) {
                    Some(&(s, e)) => Token::deferred(
                        kind,
                        Span::new(line.start + s, line.start + e),
                        line.text[s..e].to_string(),
                    ),
                    None => Token::new(kind, Span::new(row_end, row_end)),
                }
            })
            .collect();
        Token::with_children(
            TokenKind::TableRow { header },
            Span::new(line.start, line.end),
            cells,
        )
    }
}

impl Rule<BlockContext> for Table {
    fn name(&self) -> &str {
        names::TABLE
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

        let mut rows = Vec::with_capacity(scan.rows.len() + 1);
        rows.push(Self::row(&scan.header, true, &scan.alignments));
        rows.extend(
            scan.rows
                .iter()
                .map(|line| Self::row(line, false, &scan.alignments)),
        );

        let token = Token::with_children(
            TokenKind::Table {
                alignments: scan.alignments,
            },
            m.span(),
            rows,
        );
        Ok(Applied::single(token, m.len()))
    }
}
