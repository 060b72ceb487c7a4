//! Prelude module for convenient imports
//!
//! This module re-exports the types needed to parse documents and to write
//! custom rules. Importing it with a wildcard brings them into scope:
//!
//! ```
//! use markdialect::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Parsing
//! - [`Dialect`] - Ordered block and inline rule lists
//! - [`DialectBuilder`] - Builder for editing rule lists
//! - [`Parser`] / [`ParserConfig`] - Two-phase driver and its limits
//! - [`parse()`] - Parse with default limits
//!
//! ## Output
//! - [`Document`], [`Token`], [`TokenKind`], [`Span`]
//! - [`HtmlRenderer`], [`TreePrinter`]
//!
//! ## Writing Rules
//! - [`Rule`] - Rule trait
//! - [`Match`], [`Applied`] - Match and application results
//! - [`BlockContext`], [`InlineContext`] - Parsing contexts
//! - [`names`] - Names of the built-in rules, for use as anchors
//!
//! ## Error Handling
//! - [`EngineError`], [`BuildError`]

// ============================================================================
// Parsing
// ============================================================================

pub use crate::engine::{parse, Dialect, DialectBuilder, Parser, ParserConfig};

// ============================================================================
// Output
// ============================================================================

pub use crate::engine::{Document, HtmlRenderer, Span, Token, TokenKind, TreePrinter};

// ============================================================================
// Writing Rules
// ============================================================================

pub use crate::engine::{Applied, BlockContext, InlineContext, Match, Rule};
pub use crate::rules::names;

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::engine::{BuildError, EngineError};
