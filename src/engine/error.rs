//! Engine and dialect-building errors
//!
//! Malformed markup is never an error: the fallback rules turn anything
//! unrecognized into plain text. What remains are defects in a rule or a
//! dialect, and the input size limit.

use super::source_location::{line_at_offset, SourcePosition};
use std::fmt;

/// Which of the two parsing passes a rule list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    /// Block-level structure (paragraphs, lists, code blocks, ...)
    Block,
    /// Span-level structure inside block text (emphasis, links, ...)
    Inline,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Block => write!(f, "block"),
            Pass::Inline => write!(f, "inline"),
        }
    }
}

/// Fatal conditions that abort a parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A rule matched but reported zero consumed bytes
    ///
    /// Continuing would loop forever; this is a bug in the rule.
    EmptyMatch {
        /// Pass the rule belongs to
        pass: Pass,
        /// Name of the offending rule
        rule: String,
        /// Byte offset (in the scope text) where the rule matched
        position: usize,
    },

    /// A rule reported consuming past the end of its input, or into the
    /// middle of a UTF-8 sequence
    Overrun {
        /// Pass the rule belongs to
        pass: Pass,
        /// Name of the offending rule
        rule: String,
        /// Byte offset (in the scope text) where the rule matched
        position: usize,
        /// Bytes the rule claimed
        consumed: usize,
        /// Bytes that were actually left
        remaining: usize,
    },

    /// No rule matched the remaining input
    ///
    /// Only possible with a rule list that lacks a fallback rule.
    NoRuleMatched {
        /// Pass that ran out of rules
        pass: Pass,
        /// Byte offset (in the scope text) that nothing matched
        position: usize,
    },

    /// Input exceeds maximum allowed size
    InputTooLarge {
        /// Size of the input in bytes
        input_size: usize,
        /// Maximum allowed size
        max_size: usize,
    },
}

impl EngineError {
    /// Byte offset the error refers to, if any
    pub fn position(&self) -> Option<usize> {
        match self {
            EngineError::EmptyMatch { position, .. }
            | EngineError::Overrun { position, .. }
            | EngineError::NoRuleMatched { position, .. } => Some(*position),
            EngineError::InputTooLarge { .. } => None,
        }
    }

    /// Add line/column information to the error message
    ///
    /// Positions of errors raised inside nested scopes (blockquote or list
    /// item bodies, inline text) are relative to that scope, so the
    /// reported line is only exact for top-level block errors.
    pub fn format_with_position(&self, input: &str) -> String {
        match self.position() {
            Some(offset) => {
                let sp = SourcePosition::from_offset(input, offset);
                format!("{} ({})", self, sp)
            }
            None => self.to_string(),
        }
    }

    /// The source line containing the error position
    pub fn source_line<'a>(&self, input: &'a str) -> Option<&'a str> {
        self.position().map(|offset| line_at_offset(input, offset))
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::EmptyMatch {
                pass,
                rule,
                position,
            } => write!(
                f,
                "Internal error: {} rule '{}' matched at byte {} without consuming input",
                pass, rule, position
            ),
            EngineError::Overrun {
                pass,
                rule,
                position,
                consumed,
                remaining,
            } => write!(
                f,
                "Internal error: {} rule '{}' at byte {} consumed {} bytes but only {} remain or the end splits a character",
                pass, rule, position, consumed, remaining
            ),
            EngineError::NoRuleMatched { pass, position } => write!(
                f,
                "No {} rule matched at byte {}; the dialect has no fallback rule",
                pass, position
            ),
            EngineError::InputTooLarge {
                input_size,
                max_size,
            } => write!(
                f,
                "Input too large: {} bytes exceeds limit of {} bytes",
                input_size, max_size
            ),
        }
    }
}

impl std::error::Error for EngineError {}

/// Problems detected while assembling a dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// An anchor or replacement target does not name a registered rule
    UnknownRule {
        /// Rule list that was searched
        pass: Pass,
        /// The missing name
        name: String,
    },

    /// Two rules in the same list share a name
    DuplicateRule {
        /// Rule list holding the duplicates
        pass: Pass,
        /// The repeated name
        name: String,
    },

    /// A rule list has no fallback rule, so parsing could get stuck
    MissingFallback {
        /// Rule list lacking the fallback
        pass: Pass,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownRule { pass, name } => {
                write!(f, "Unknown {} rule '{}'", pass, name)
            }
            BuildError::DuplicateRule { pass, name } => {
                write!(f, "Duplicate {} rule '{}'", pass, name)
            }
            BuildError::MissingFallback { pass } => {
                write!(f, "The {} rule list has no fallback rule", pass)
            }
        }
    }
}

impl std::error::Error for BuildError {}
