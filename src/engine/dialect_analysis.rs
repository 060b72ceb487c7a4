//! Dialect analysis and warnings
//!
//! Rule order decides everything in a dialect, so ordering mistakes are
//! silent: a rule registered after a catch-all never runs, and a list
//! without a catch-all can get stuck. The analyzer reports:
//! - rule lists without a fallback rule
//! - rules that follow a fallback rule (unreachable)
//! - rule names used more than once
//!
//! # Example
//!
//! ```
//! use markdialect::{Dialect, DialectAnalyzer};
//!
//! let warnings = DialectAnalyzer::new(&Dialect::gfm()).analyze();
//! assert!(warnings.is_empty());
//! ```

use std::sync::Arc;

use hashbrown::HashSet;

use super::dialect::Dialect;
use super::error::Pass;
use super::rule::Rule;

/// Kind of dialect warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// No rule in the list matches arbitrary input
    ///
    /// Parsing fails with `NoRuleMatched` on the first unrecognized byte.
    MissingFallback,

    /// The rule comes after a fallback rule and can never be reached
    UnreachableRule,

    /// Two rules share a name, so lookups by name are ambiguous
    DuplicateRule,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFallback => write!(f, "missing fallback"),
            Self::UnreachableRule => write!(f, "unreachable rule"),
            Self::DuplicateRule => write!(f, "duplicate rule"),
        }
    }
}

/// A dialect warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectWarning {
    /// The kind of warning
    pub kind: WarningKind,
    /// Rule list the warning is about
    pub pass: Pass,
    /// Position of the offending rule, if the warning is about one rule
    pub index: Option<usize>,
    /// Human-readable message
    pub message: String,
}

impl DialectWarning {
    fn new(kind: WarningKind, pass: Pass, index: Option<usize>, message: String) -> Self {
        Self {
            kind,
            pass,
            index,
            message,
        }
    }
}

impl std::fmt::Display for DialectWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(i) => write!(f, "[{} rule {}] {}: {}", self.pass, i, self.kind, self.message),
            None => write!(f, "[{} rules] {}: {}", self.pass, self.kind, self.message),
        }
    }
}

/// Dialect analyzer
pub struct DialectAnalyzer<'a> {
    dialect: &'a Dialect,
}

impl<'a> DialectAnalyzer<'a> {
    /// Create a new analyzer for the given dialect
    pub fn new(dialect: &'a Dialect) -> Self {
        Self { dialect }
    }

    /// Analyze both rule lists and return all warnings
    pub fn analyze(&self) -> Vec<DialectWarning> {
        let mut warnings = analyze_rules(Pass::Block, self.dialect.block_rules());
        warnings.extend(analyze_rules(Pass::Inline, self.dialect.inline_rules()));
        warnings
    }
}

/// Analyze one ordered rule list
///
/// Useful for rule lists handed straight to a context without going
/// through a builder.
pub fn analyze_rules<C>(pass: Pass, rules: &[Arc<dyn Rule<C>>]) -> Vec<DialectWarning> {
    let mut warnings = Vec::new();

    match rules.iter().position(|r| r.is_fallback()) {
        None => warnings.push(DialectWarning::new(
            WarningKind::MissingFallback,
            pass,
            None,
            "no rule matches arbitrary input; unrecognized text stops the parse".to_string(),
        )),
        Some(first) => {
            for (i, rule) in rules.iter().enumerate().skip(first + 1) {
                warnings.push(DialectWarning::new(
                    WarningKind::UnreachableRule,
                    pass,
                    Some(i),
                    format!(
                        "rule '{}' follows fallback rule '{}' and never runs",
                        rule.name(),
                        rules[first].name()
                    ),
                ));
            }
        }
    }

    let mut seen = HashSet::new();
    for (i, rule) in rules.iter().enumerate() {
        if !seen.insert(rule.name()) {
            warnings.push(DialectWarning::new(
                WarningKind::DuplicateRule,
                pass,
                Some(i),
                format!("rule name '{}' is already used", rule.name()),
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::BlockContext;
    use crate::rules::block::{BlankLine, BlockText, Paragraph};

    #[test]
    fn test_no_warnings_for_builtin_dialects() {
        assert!(DialectAnalyzer::new(&Dialect::markdown()).analyze().is_empty());
        assert!(DialectAnalyzer::new(&Dialect::gfm()).analyze().is_empty());
    }

    #[test]
    fn test_detect_missing_fallback() {
        let rules: Vec<Arc<dyn Rule<BlockContext>>> = vec![Arc::new(BlankLine), Arc::new(Paragraph)];
        let warnings = analyze_rules(Pass::Block, &rules);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::MissingFallback);
        assert!(warnings[0].to_string().starts_with("[block rules] missing fallback"));
    }

    #[test]
    fn test_detect_unreachable_rule() {
        let rules: Vec<Arc<dyn Rule<BlockContext>>> =
            vec![Arc::new(BlankLine), Arc::new(BlockText), Arc::new(Paragraph)];
        let warnings = analyze_rules(Pass::Block, &rules);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::UnreachableRule);
        assert_eq!(warnings[0].index, Some(2));
        assert!(warnings[0].message.contains("'paragraph'"));
    }

    #[test]
    fn test_detect_duplicate_rule() {
        let rules: Vec<Arc<dyn Rule<BlockContext>>> =
            vec![Arc::new(BlankLine), Arc::new(BlankLine), Arc::new(BlockText)];
        let warnings = analyze_rules(Pass::Block, &rules);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::DuplicateRule);
        assert_eq!(warnings[0].index, Some(1));
    }
}
