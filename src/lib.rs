//! markdialect - Rule-based Markdown dialect engine
//!
//! Markdown parsing as two ordered lists of rules, one for block structure
//! and one for inline spans. The engine only knows how to run rules; the
//! syntax lives in the rules themselves, so a dialect is just a list you
//! can copy and edit:
//! - Built-in classic Markdown and GitHub-flavored dialects
//! - Builder for inserting, replacing and removing rules by name
//! - Token tree with byte spans into the source
//! - Forward link references through a two-phase parse
//! - Nesting limits that degrade deep markup to text instead of failing
//! - HTML rendering and tree printing
//! - Optional parallel batch parsing
//!
//! ## Quick Start
//!
//! ```rust
//! use markdialect::{parse, Dialect, TokenKind};
//!
//! let doc = parse("# Hello\n\nSome *markdown*.", &Dialect::gfm()).unwrap();
//!
//! let kinds: Vec<_> = doc.blocks().map(|t| t.kind.name()).collect();
//! assert_eq!(kinds, vec!["heading", "paragraph"]);
//! assert!(matches!(doc.tokens[0].kind, TokenKind::Heading { level: 1, .. }));
//! ```
//!
//! ## Building a Dialect
//!
//! ```rust
//! use markdialect::rules::{block::FencedCode, names};
//! use markdialect::Dialect;
//!
//! let dialect = Dialect::markdown()
//!     .to_builder()
//!     .name("markdown+fences")
//!     .block_before(names::HEADING, FencedCode)
//!     .build()
//!     .unwrap();
//!
//! assert!(dialect.block_rule_names().contains(&"fenced_code"));
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate
//! - `parallel` - Parse batches on a rayon thread pool

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]

// Logging macros that compile to nothing without the `logging` feature
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}
#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

// Prelude module for convenient imports
pub mod prelude;

// Rule engine
pub mod engine;

// Built-in block and inline rules
pub mod rules;

/// Re-export commonly used types for convenience
pub use engine::{
    // Output
    debug::{SourceFormatter, TreePrinter},
    html::HtmlRenderer,
    // Batch parsing
    parallel::{parse_batch_parallel, parse_batch_parallel_owned, parse_batch_with_config},
    parse,
    Alignment,
    Applied,
    BlockContext,
    BuildError,
    Dialect,
    DialectAnalyzer,
    DialectBuilder,
    DialectWarning,
    Document,
    EngineError,
    InlineContext,
    LinkReferences,
    Match,
    Parser,
    ParserConfig,
    Rule,
    SourcePosition,
    Span,
    Token,
    TokenKind,
};
