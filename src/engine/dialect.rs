//! Dialect definitions and the builder that assembles them
//!
//! A [`Dialect`] is an immutable pair of ordered rule lists, one per pass.
//! Rule order is the only tie-break: the first rule that matches wins. New
//! dialects are made by editing a copy of an existing one through a
//! [`DialectBuilder`], never by branching inside rules.
//!
//! # Example
//!
//! ```
//! use markdialect::{rules, Dialect};
//!
//! // Markdown without raw HTML
//! let dialect = Dialect::markdown()
//!     .to_builder()
//!     .name("no-html")
//!     .remove_block(rules::names::HTML_BLOCK)
//!     .remove_inline(rules::names::HTML)
//!     .build()
//!     .unwrap();
//!
//! assert!(!dialect.block_rule_names().contains(&"html_block"));
//! ```

use std::fmt;
use std::sync::Arc;

use super::context::{BlockContext, InlineContext, RuleSet};
use super::dialect_analysis::{analyze_rules, DialectWarning};
use super::error::{BuildError, Pass};
use super::rule::Rule;

/// An immutable, shareable pair of block and inline rule lists
#[derive(Clone)]
pub struct Dialect {
    name: String,
    block: RuleSet<BlockContext>,
    inline: RuleSet<InlineContext>,
}

impl Dialect {
    /// Classic Markdown
    pub fn markdown() -> Self {
        crate::rules::markdown_builder().assemble()
    }

    /// GitHub-flavored Markdown: fenced code, tables, strikethrough and bare
    /// URLs on top of [`Dialect::markdown`]
    pub fn gfm() -> Self {
        crate::rules::gfm_builder().assemble()
    }

    /// Start an empty dialect
    pub fn builder(name: &str) -> DialectBuilder {
        DialectBuilder::new(name)
    }

    /// Start a builder holding this dialect's rules
    pub fn to_builder(&self) -> DialectBuilder {
        DialectBuilder {
            name: self.name.clone(),
            block: RuleList::from_slice(Pass::Block, &self.block),
            inline: RuleList::from_slice(Pass::Inline, &self.inline),
            errors: Vec::new(),
        }
    }

    /// Dialect name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered block rules
    pub fn block_rules(&self) -> &RuleSet<BlockContext> {
        &self.block
    }

    /// Ordered inline rules
    pub fn inline_rules(&self) -> &RuleSet<InlineContext> {
        &self.inline
    }

    /// Names of the block rules, in order
    pub fn block_rule_names(&self) -> Vec<&str> {
        self.block.iter().map(|r| r.name()).collect()
    }

    /// Names of the inline rules, in order
    pub fn inline_rule_names(&self) -> Vec<&str> {
        self.inline.iter().map(|r| r.name()).collect()
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("name", &self.name)
            .field("block", &self.block_rule_names())
            .field("inline", &self.inline_rule_names())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Ordered rule list under construction
struct RuleList<C> {
    pass: Pass,
    rules: Vec<Arc<dyn Rule<C>>>,
}

impl<C> RuleList<C> {
    fn new(pass: Pass) -> Self {
        Self {
            pass,
            rules: Vec::new(),
        }
    }

    fn from_slice(pass: Pass, rules: &[Arc<dyn Rule<C>>]) -> Self {
        Self {
            pass,
            rules: rules.to_vec(),
        }
    }

    fn position(&self, name: &str) -> Result<usize, BuildError> {
        self.rules
            .iter()
            .position(|r| r.name() == name)
            .ok_or_else(|| BuildError::UnknownRule {
                pass: self.pass,
                name: name.to_string(),
            })
    }

    fn check_new(&self, rule: &Arc<dyn Rule<C>>) -> Result<(), BuildError> {
        if self.rules.iter().any(|r| r.name() == rule.name()) {
            return Err(BuildError::DuplicateRule {
                pass: self.pass,
                name: rule.name().to_string(),
            });
        }
        Ok(())
    }

    fn push(&mut self, rule: Arc<dyn Rule<C>>) -> Result<(), BuildError> {
        self.check_new(&rule)?;
        self.rules.push(rule);
        Ok(())
    }

    fn insert_at(&mut self, anchor: &str, offset: usize, rule: Arc<dyn Rule<C>>) -> Result<(), BuildError> {
        let at = self.position(anchor)? + offset;
        self.check_new(&rule)?;
        self.rules.insert(at, rule);
        Ok(())
    }

    fn replace(&mut self, name: &str, rule: Arc<dyn Rule<C>>) -> Result<(), BuildError> {
        let at = self.position(name)?;
        if rule.name() != name {
            self.check_new(&rule)?;
        }
        self.rules[at] = rule;
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), BuildError> {
        let at = self.position(name)?;
        self.rules.remove(at);
        Ok(())
    }

    fn check_fallback(&self) -> Result<(), BuildError> {
        if self.rules.iter().any(|r| r.is_fallback()) {
            Ok(())
        } else {
            Err(BuildError::MissingFallback { pass: self.pass })
        }
    }

    fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    fn into_set(self) -> RuleSet<C> {
        self.rules.into()
    }
}

/// Builder for [`Dialect`]s
///
/// Every method consumes and returns the builder. A failing edit (unknown
/// anchor, duplicate name) is skipped and recorded; [`build`](Self::build)
/// reports the first one.
pub struct DialectBuilder {
    name: String,
    block: RuleList<BlockContext>,
    inline: RuleList<InlineContext>,
    errors: Vec<BuildError>,
}

impl DialectBuilder {
    /// Create a builder with empty rule lists
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            block: RuleList::new(Pass::Block),
            inline: RuleList::new(Pass::Inline),
            errors: Vec::new(),
        }
    }

    /// Rename the dialect
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    fn record(mut self, result: Result<(), BuildError>) -> Self {
        if let Err(e) = result {
            log_debug!("dialect '{}': {}", self.name, e);
            self.errors.push(e);
        }
        self
    }

    // ------------------------------------------------------------------
    // Block rules
    // ------------------------------------------------------------------

    /// Append a block rule
    pub fn block(mut self, rule: impl Rule<BlockContext> + 'static) -> Self {
        let result = self.block.push(Arc::new(rule));
        self.record(result)
    }

    /// Insert a block rule before the rule named `anchor`
    pub fn block_before(mut self, anchor: &str, rule: impl Rule<BlockContext> + 'static) -> Self {
        let result = self.block.insert_at(anchor, 0, Arc::new(rule));
        self.record(result)
    }

    /// Insert a block rule after the rule named `anchor`
    pub fn block_after(mut self, anchor: &str, rule: impl Rule<BlockContext> + 'static) -> Self {
        let result = self.block.insert_at(anchor, 1, Arc::new(rule));
        self.record(result)
    }

    /// Replace the block rule named `name`, keeping its position
    pub fn replace_block(mut self, name: &str, rule: impl Rule<BlockContext> + 'static) -> Self {
        let result = self.block.replace(name, Arc::new(rule));
        self.record(result)
    }

    /// Remove the block rule named `name`
    pub fn remove_block(mut self, name: &str) -> Self {
        let result = self.block.remove(name);
        self.record(result)
    }

    // ------------------------------------------------------------------
    // Inline rules
    // ------------------------------------------------------------------

    /// Append an inline rule
    pub fn inline(mut self, rule: impl Rule<InlineContext> + 'static) -> Self {
        let result = self.inline.push(Arc::new(rule));
        self.record(result)
    }

    /// Insert an inline rule before the rule named `anchor`
    pub fn inline_before(mut self, anchor: &str, rule: impl Rule<InlineContext> + 'static) -> Self {
        let result = self.inline.insert_at(anchor, 0, Arc::new(rule));
        self.record(result)
    }

    /// Insert an inline rule after the rule named `anchor`
    pub fn inline_after(mut self, anchor: &str, rule: impl Rule<InlineContext> + 'static) -> Self {
        let result = self.inline.insert_at(anchor, 1, Arc::new(rule));
        self.record(result)
    }

    /// Replace the inline rule named `name`, keeping its position
    pub fn replace_inline(mut self, name: &str, rule: impl Rule<InlineContext> + 'static) -> Self {
        let result = self.inline.replace(name, Arc::new(rule));
        self.record(result)
    }

    /// Remove the inline rule named `name`
    pub fn remove_inline(mut self, name: &str) -> Self {
        let result = self.inline.remove(name);
        self.record(result)
    }

    // ------------------------------------------------------------------
    // Finishing
    // ------------------------------------------------------------------

    /// Edits that failed so far
    pub fn errors(&self) -> &[BuildError] {
        &self.errors
    }

    /// Ordering warnings for the rules assembled so far
    pub fn analyze(&self) -> Vec<DialectWarning> {
        let mut warnings = analyze_rules(Pass::Block, &self.block.rules);
        warnings.extend(analyze_rules(Pass::Inline, &self.inline.rules));
        warnings
    }

    /// Finish the dialect
    ///
    /// Fails on the first recorded edit error, or if either rule list lacks
    /// a fallback rule.
    pub fn build(self) -> Result<Dialect, BuildError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        self.block.check_fallback()?;
        self.inline.check_fallback()?;
        Ok(Dialect {
            name: self.name,
            block: self.block.into_set(),
            inline: self.inline.into_set(),
        })
    }

    /// Finish without validation, for the built-in dialects
    pub(crate) fn assemble(self) -> Dialect {
        Dialect {
            name: self.name,
            block: self.block.into_set(),
            inline: self.inline.into_set(),
        }
    }
}

impl fmt::Debug for DialectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectBuilder")
            .field("name", &self.name)
            .field("block", &self.block.names())
            .field("inline", &self.inline.names())
            .field("errors", &self.errors)
            .finish()
    }
}
