//! Rule engine
//!
//! The engine knows nothing about Markdown itself. It runs ordered lists of
//! [`Rule`]s over text, in two passes, and assembles the resulting
//! [`Token`] tree. The rules in [`crate::rules`] supply the syntax.
//!
//! # Module Organization
//!
//! ## Core Types
//! - [`Rule`], [`Match`], [`Applied`] - the rule contract
//! - [`BlockContext`], [`InlineContext`] - per-scope parsing state
//! - [`scan_cache`] - per-run memo of lookahead scans
//! - [`Dialect`], [`DialectBuilder`] - ordered rule lists
//! - [`Parser`], [`ParserConfig`] - the two-phase driver
//! - [`Token`], [`TokenKind`], [`Document`] - output tree
//!
//! ## Diagnostics
//! - [`dialect_analysis`] - static checks on rule lists
//! - [`debug`] - tree printing and source excerpts
//!
//! ## Output
//! - [`html`] - HTML rendering
//! - [`parallel`] - batch parsing

// ============================================================================
// Module Declarations
// ============================================================================

pub mod context;
pub mod debug;
pub mod dialect;
pub mod dialect_analysis;
pub mod error;
pub mod html;
pub mod parser;
pub mod references;
pub mod regex_cache;
pub mod rule;
pub mod scan;
pub mod scan_cache;
pub mod source_location;
pub mod token;

// Batch parsing (always available, uses rayon when feature is enabled)
pub mod parallel;

// ============================================================================
// Core Types
// ============================================================================

pub use context::{BlockContext, BlockState, InlineContext, InlineState, RuleSet, Scope};
pub use dialect::{Dialect, DialectBuilder};
pub use parser::{parse, run, Parser, ParserConfig, DEFAULT_MAX_INPUT_SIZE};
pub use rule::{Applied, Match, Rule};
pub use token::{Alignment, Document, Token, TokenKind};

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{BuildError, EngineError, Pass};

// ============================================================================
// Link References
// ============================================================================

pub use references::{normalize_label, LinkReferences, LinkTarget};

// ============================================================================
// Source Location
// ============================================================================

pub use source_location::{SourcePosition, Span};

// ============================================================================
// Dialect Analysis
// ============================================================================

pub use dialect_analysis::{DialectAnalyzer, DialectWarning, WarningKind};

// ============================================================================
// Output
// ============================================================================

pub use debug::{SourceFormatter, TreePrinter};
pub use html::HtmlRenderer;
pub use parallel::{parse_batch_parallel, parse_batch_parallel_owned, parse_batch_with_config};
