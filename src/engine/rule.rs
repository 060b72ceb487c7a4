//! Rule extension points
//!
//! A dialect is two ordered lists of rules. The engine tries the rules of
//! the active list in order at the current position; the first one whose
//! [`Rule::try_match`] succeeds gets to [`Rule::apply`] and the engine
//! advances by the number of bytes it reports consumed.
//!
//! # Example
//!
//! ```
//! use markdialect::prelude::*;
//!
//! /// Turns `@name` into a link to a user page
//! struct Mention;
//!
//! impl Rule<InlineContext> for Mention {
//!     fn name(&self) -> &str {
//!         "mention"
//!     }
//!
//!     fn try_match(&self, input: &str, pos: usize, _cx: &InlineContext) -> Option<Match> {
//!         let rest = input.get(pos..)?.strip_prefix('@')?;
//!         let len = rest.bytes().take_while(|b| b.is_ascii_alphanumeric()).count();
//!         (len > 0).then(|| Match::new(pos, pos + 1 + len))
//!     }
//!
//!     fn apply(&self, m: &Match, input: &str, _cx: &InlineContext) -> Result<Applied, EngineError> {
//!         let name = &input[m.start + 1..m.end];
//!         let link = Token::with_children(
//!             TokenKind::Link { url: format!("/users/{}", name), title: None },
//!             m.span(),
//!             vec![Token::text(m.as_str(input), Span::new(0, m.len()))],
//!         );
//!         Ok(Applied::single(link, m.len()))
//!     }
//! }
//!
//! let dialect = Dialect::gfm()
//!     .to_builder()
//!     .inline_before("text", Mention)
//!     .build()
//!     .unwrap();
//!
//! let doc = markdialect::parse("@ferris says hi", &dialect).unwrap();
//! let para = &doc.tokens[0];
//! assert!(matches!(&para.children[0].kind, TokenKind::Link { url, .. } if url == "/users/ferris"));
//! ```

use regex::Captures;

use super::error::EngineError;
use super::source_location::Span;
use super::token::Token;

/// A single construct matcher and token producer
///
/// `C` is the context of the pass the rule belongs to
/// ([`BlockContext`](super::context::BlockContext) or
/// [`InlineContext`](super::context::InlineContext)).
///
/// # Contract
///
/// * Rules inspect `input` only from `pos` forward.
/// * A successful `apply` must consume at least one byte and end on a char
///   boundary; the engine aborts the parse otherwise.
/// * Produced token spans are byte ranges in `input` (the scope text), and
///   together must cover exactly the consumed range.
/// * Rules hold no mutable state. They may be shared between threads and
///   dialects.
pub trait Rule<C>: Send + Sync {
    /// Stable name used for lookup, ordering and replacement
    fn name(&self) -> &str;

    /// Check whether the rule matches at `pos`
    fn try_match(&self, input: &str, pos: usize, cx: &C) -> Option<Match>;

    /// Produce tokens for a successful match
    ///
    /// Errors are reserved for engine-fatal conditions raised by nested
    /// parses; malformed input must never produce one.
    fn apply(&self, m: &Match, input: &str, cx: &C) -> Result<Applied, EngineError>;

    /// Would a line starting at `pos` end an open paragraph?
    ///
    /// Only consulted for block rules. Must be cheap: it runs once per
    /// paragraph continuation line.
    fn interrupts(&self, _input: &str, _pos: usize, _cx: &C) -> bool {
        false
    }

    /// Whether the rule matches any non-empty remaining input
    ///
    /// A rule list needs at least one fallback to guarantee progress.
    fn is_fallback(&self) -> bool {
        false
    }
}

/// Successful match of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Start offset in the scope text (the engine position)
    pub start: usize,
    /// End offset of the matched text
    pub end: usize,
    groups: Vec<Option<(usize, usize)>>,
}

impl Match {
    /// Create a match without capture groups
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            groups: Vec::new(),
        }
    }

    /// Create a match from regex captures taken on `input[pos..]`
    ///
    /// Group offsets are shifted back into scope coordinates. Group 0 is the
    /// whole match.
    pub fn from_captures(pos: usize, caps: &Captures<'_>) -> Self {
        let groups: Vec<_> = caps
            .iter()
            .map(|g| g.map(|m| (pos + m.start(), pos + m.end())))
            .collect();
        let end = groups.first().copied().flatten().map_or(pos, |(_, e)| e);
        Self {
            start: pos,
            end,
            groups,
        }
    }

    /// Attach capture ranges to a hand-built match
    pub fn with_groups(mut self, groups: Vec<Option<(usize, usize)>>) -> Self {
        self.groups = groups;
        self
    }

    /// Length of the matched text in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the match is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Span of the matched text
    #[inline]
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// The matched text
    pub fn as_str<'a>(&self, input: &'a str) -> &'a str {
        input.get(self.start..self.end).unwrap_or("")
    }

    /// Range of capture group `i`, if it participated in the match
    pub fn group(&self, i: usize) -> Option<(usize, usize)> {
        self.groups.get(i).copied().flatten()
    }

    /// Text of capture group `i`
    pub fn group_str<'a>(&self, input: &'a str, i: usize) -> Option<&'a str> {
        let (start, end) = self.group(i)?;
        input.get(start..end)
    }
}

/// Output of [`Rule::apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Tokens to append to the output of the current scope
    pub tokens: Vec<Token>,
    /// Bytes consumed from the match start
    pub consumed: usize,
}

impl Applied {
    /// Create a result from several tokens
    #[inline]
    pub fn new(tokens: Vec<Token>, consumed: usize) -> Self {
        Self { tokens, consumed }
    }

    /// Create a result holding one token
    #[inline]
    pub fn single(token: Token, consumed: usize) -> Self {
        Self {
            tokens: vec![token],
            consumed,
        }
    }
}
