//! Engine driver
//!
//! [`run`] is the rule loop shared by both passes: try the rules of the
//! context in order, let the first match produce tokens, advance, repeat
//! until the scope text is exhausted.
//!
//! [`Parser`] drives a whole document in two phases:
//!
//! 1. the block pass over the source, leaving inline-bearing blocks with
//!    their raw text as a placeholder;
//! 2. after collecting link-reference definitions from the block tree, the
//!    inline pass over every placeholder.
//!
//! Running the inline pass last lets reference links point at definitions
//! further down the document.
//!
//! # Example
//!
//! ```
//! use markdialect::{Dialect, Parser, ParserConfig, TokenKind};
//!
//! let dialect = Dialect::markdown();
//! let config = ParserConfig::new().with_max_nesting_depth(8);
//! let doc = Parser::with_config(&dialect, config)
//!     .parse("# Title\n\nBody text.")
//!     .unwrap();
//!
//! assert!(matches!(doc.tokens[0].kind, TokenKind::Heading { level: 1, .. }));
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::context::{
    BlockContext, BlockState, InlineContext, InlineState, Scope, DEFAULT_MAX_INLINE_DEPTH,
    DEFAULT_MAX_NESTING,
};
use super::dialect::Dialect;
use super::error::EngineError;
use super::references::LinkReferences;
use super::token::{Document, Token, TokenKind};

/// Default maximum input size (100 MB)
pub const DEFAULT_MAX_INPUT_SIZE: usize = 100 * 1024 * 1024;

// ============================================================================
// Rule loop
// ============================================================================

/// Run the rules of `cx` over `input` until it is consumed
///
/// Each iteration advances by at least one byte or fails, so the loop
/// performs at most `input.len()` rule applications.
pub fn run<C: Scope>(input: &str, cx: &C) -> Result<Vec<Token>, EngineError> {
    let fresh = cx.for_run();
    let cx = fresh.as_ref().unwrap_or(cx);
    let mut tokens = Vec::new();
    let mut pos = 0;

    'scan: while pos < input.len() {
        for rule in cx.rules() {
            let Some(m) = rule.try_match(input, pos, cx) else {
                continue;
            };
            let applied = rule.apply(&m, input, cx)?;
            let remaining = input.len() - pos;

            if applied.consumed == 0 {
                return Err(EngineError::EmptyMatch {
                    pass: C::PASS,
                    rule: rule.name().to_string(),
                    position: pos,
                });
            }
            if applied.consumed > remaining || !input.is_char_boundary(pos + applied.consumed) {
                return Err(EngineError::Overrun {
                    pass: C::PASS,
                    rule: rule.name().to_string(),
                    position: pos,
                    consumed: applied.consumed,
                    remaining,
                });
            }

            log_trace!(
                "{} rule '{}' matched {}..{}",
                C::PASS,
                rule.name(),
                pos,
                pos + applied.consumed
            );
            tokens.extend(applied.tokens);
            pos += applied.consumed;
            continue 'scan;
        }

        return Err(EngineError::NoRuleMatched {
            pass: C::PASS,
            position: pos,
        });
    }

    Ok(tokens)
}

// ============================================================================
// Configuration
// ============================================================================

/// Limits applied to one parse
///
/// # Example
///
/// ```
/// use markdialect::ParserConfig;
///
/// let config = ParserConfig::from_json(r#"{ "max_nesting_depth": 4 }"#).unwrap();
/// assert_eq!(config.max_nesting_depth, 4);
/// assert_eq!(config.max_inline_depth, 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum input size in bytes (0 = unlimited)
    pub max_input_size: usize,

    /// Maximum blockquote plus list nesting; deeper markers become text
    pub max_nesting_depth: usize,

    /// Maximum nesting of inline spans; deeper markers become text
    pub max_inline_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            max_nesting_depth: DEFAULT_MAX_NESTING,
            max_inline_depth: DEFAULT_MAX_INLINE_DEPTH,
        }
    }
}

impl ParserConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a config from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the maximum input size
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// Set the maximum container nesting
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Set the maximum inline span nesting
    pub fn with_max_inline_depth(mut self, depth: usize) -> Self {
        self.max_inline_depth = depth;
        self
    }
}

// ============================================================================
// Document parser
// ============================================================================

/// Parses documents with one dialect and config
#[derive(Debug, Clone)]
pub struct Parser<'d> {
    dialect: &'d Dialect,
    config: ParserConfig,
}

impl<'d> Parser<'d> {
    /// Create a parser with the default config
    pub fn new(dialect: &'d Dialect) -> Self {
        Self::with_config(dialect, ParserConfig::default())
    }

    /// Create a parser with a custom config
    pub fn with_config(dialect: &'d Dialect, config: ParserConfig) -> Self {
        Self { dialect, config }
    }

    /// The active config
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The dialect in use
    pub fn dialect(&self) -> &Dialect {
        self.dialect
    }

    /// Root block context for a parse, with an empty reference table
    pub fn block_context(&self) -> BlockContext {
        let inline = InlineContext::new(
            Arc::clone(self.dialect.inline_rules()),
            Arc::new(LinkReferences::new()),
            InlineState {
                max_depth: self.config.max_inline_depth,
                ..InlineState::default()
            },
        );
        BlockContext::new(
            Arc::clone(self.dialect.block_rules()),
            inline,
            BlockState {
                max_nesting: self.config.max_nesting_depth,
                ..BlockState::default()
            },
        )
    }

    /// Parse a document
    ///
    /// Fails only on input over the size limit or a defective rule.
    pub fn parse(&self, source: &str) -> Result<Document, EngineError> {
        let max = self.config.max_input_size;
        if max > 0 && source.len() > max {
            return Err(EngineError::InputTooLarge {
                input_size: source.len(),
                max_size: max,
            });
        }

        log_debug!(
            "parsing {} bytes with dialect '{}'",
            source.len(),
            self.dialect.name()
        );

        let block = self.block_context();
        let mut tokens = block.parse(source)?;

        let references = Arc::new(LinkReferences::collect_from(&tokens));
        log_debug!("collected {} link reference(s)", references.len());

        let inline = block.inline().with_references(Arc::clone(&references));
        resolve_inline(&mut tokens, &inline)?;
        drop(inline);
        drop(block);

        let references = Arc::try_unwrap(references).unwrap_or_else(|shared| (*shared).clone());
        log_debug!("parsed {} top-level block(s)", tokens.len());

        Ok(Document { tokens, references })
    }
}

/// Replace inline placeholders with their inline parse, depth-first
fn resolve_inline(tokens: &mut [Token], cx: &InlineContext) -> Result<(), EngineError> {
    for token in tokens {
        if !token.kind.is_inline_container() {
            resolve_inline(&mut token.children, cx)?;
            continue;
        }
        let Some(source) = token.deferred_source() else {
            continue;
        };
        let children = if matches!(token.kind, TokenKind::TableCell { .. }) {
            cx.derive(|s| s.in_table_cell = true).parse(source)?
        } else {
            cx.parse(source)?
        };
        token.children = children;
    }
    Ok(())
}

/// Parse a document with the default config
///
/// # Example
///
/// ```
/// use markdialect::{parse, Dialect, TokenKind};
///
/// let doc = parse("Hello *world*", &Dialect::markdown()).unwrap();
/// assert_eq!(doc.tokens.len(), 1);
/// assert_eq!(doc.tokens[0].kind, TokenKind::Paragraph);
/// ```
pub fn parse(source: &str, dialect: &Dialect) -> Result<Document, EngineError> {
    Parser::new(dialect).parse(source)
}
