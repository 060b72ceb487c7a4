//! Paragraphs and the block fallback

use crate::engine::context::BlockContext;
use crate::engine::error::EngineError;
use crate::engine::rule::{Applied, Match, Rule};
use crate::engine::scan::{line_at, lines_from, trim_blank_end, trim_blank_start};
use crate::engine::token::{Token, TokenKind};
use crate::rules::names;

/// End of a run of text lines starting at `first_end`
///
/// Stops before a blank line or a line where another rule would start.
fn continuation_end(input: &str, first_end: usize, cx: &BlockContext) -> usize {
    let mut end = first_end;
    for line in lines_from(input, first_end) {
        if line.is_blank() || cx.interrupts_at(input, line.start) {
            break;
        }
        end = line.end;
    }
    end
}

/// Inline source of a paragraph: leading indentation dropped from each
/// line, trailing whitespace dropped from the last one
fn inline_source(input: &str, m: &Match) -> String {
    let lines: Vec<&str> = lines_from(&input[..m.end], m.start)
        .map(|line| trim_blank_start(line.text))
        .collect();
    trim_blank_end(&lines.join("\n")).to_string()
}

/// Lines of text up to a blank line or an interrupting block
///
/// Only recognized in top-level scopes (the document and blockquote
/// bodies); list items use [`BlockText`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Paragraph;

impl Rule<BlockContext> for Paragraph {
    fn name(&self) -> &str {
        names::PARAGRAPH
    }

    fn try_match(&self, input: &str, pos: usize, cx: &BlockContext) -> Option<Match> {
        if !cx.state().top_level {
            return None;
        }
        let first = line_at(input, pos)?;
        if first.is_blank() {
            return None;
        }
        Some(Match::new(pos, continuation_end(input, first.end, cx)))
    }

    fn apply(&self, m: &Match, input: &str, _cx: &BlockContext) -> Result<Applied, EngineError> {
        let token = Token::deferred(TokenKind::Paragraph, m.span(), inline_source(input, m));
        Ok(Applied::single(token, m.len()))
    }
}

/// Block fallback: matches any remaining input and emits `Plain`
///
/// Aggregates lines like [`Paragraph`]. A blank first line (possible when a
/// dialect drops the blank-line rule) is consumed on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockText;

impl Rule<BlockContext> for BlockText {
    fn name(&self) -> &str {
        names::TEXT
    }

    fn try_match(&self, input: &str, pos: usize, cx: &BlockContext) -> Option<Match> {
        let first = line_at(input, pos)?;
        let end = if first.is_blank() {
            first.end
        } else {
            continuation_end(input, first.end, cx)
        };
        Some(Match::new(pos, end))
    }

    fn apply(&self, m: &Match, input: &str, _cx: &BlockContext) -> Result<Applied, EngineError> {
        let token = Token::deferred(TokenKind::Plain, m.span(), inline_source(input, m));
        Ok(Applied::single(token, m.len()))
    }

    fn is_fallback(&self) -> bool {
        true
    }
}
