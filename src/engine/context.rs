//! Parsing contexts
//!
//! A context is the immutable environment of one engine run: the active
//! rule list, typed parse-time flags, and (for the block pass) the inline
//! companion used for span-level content. Child scopes are created with
//! `derive`, which copies the flags, applies an overlay and shares the rule
//! list by reference.

use std::fmt;
use std::sync::Arc;

use super::error::{EngineError, Pass};
use super::parser::run;
use super::references::LinkReferences;
use super::rule::Rule;
use super::scan_cache::ScanCache;
use super::token::{coalesce_text, Token};

/// Shared, immutable ordered rule list
pub type RuleSet<C> = Arc<[Arc<dyn Rule<C>>]>;

/// Default limit for blockquote plus list nesting
pub const DEFAULT_MAX_NESTING: usize = 32;

/// Default limit for nested inline spans
pub const DEFAULT_MAX_INLINE_DEPTH: usize = 32;

/// Contexts the engine driver can run
pub trait Scope: Sized {
    /// Pass reported in errors
    const PASS: Pass;

    /// Rules to try, in order
    fn rules(&self) -> &[Arc<dyn Rule<Self>>];

    /// Copy of this context for a new run, if it keeps per-run state
    fn for_run(&self) -> Option<Self> {
        None
    }
}

// ============================================================================
// Block pass
// ============================================================================

/// Flags visible to block rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockState {
    /// Document or blockquote body (not a list item body)
    pub top_level: bool,
    /// Number of enclosing blockquotes
    pub quote_depth: usize,
    /// Number of enclosing list items
    pub list_depth: usize,
    /// Limit on `quote_depth + list_depth`
    pub max_nesting: usize,
}

impl BlockState {
    /// Current container nesting
    #[inline]
    pub fn nesting(&self) -> usize {
        self.quote_depth + self.list_depth
    }

    /// Whether a container may open another nested scope
    #[inline]
    pub fn can_nest(&self) -> bool {
        self.nesting() < self.max_nesting
    }
}

impl Default for BlockState {
    fn default() -> Self {
        Self {
            top_level: true,
            quote_depth: 0,
            list_depth: 0,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

/// Environment of a block engine run
#[derive(Clone)]
pub struct BlockContext {
    rules: RuleSet<BlockContext>,
    inline: InlineContext,
    state: BlockState,
}

impl BlockContext {
    /// Create a root block context
    pub fn new(rules: RuleSet<BlockContext>, inline: InlineContext, state: BlockState) -> Self {
        Self {
            rules,
            inline,
            state,
        }
    }

    /// Parse-time flags
    #[inline]
    pub fn state(&self) -> &BlockState {
        &self.state
    }

    /// Companion context for span-level content
    #[inline]
    pub fn inline(&self) -> &InlineContext {
        &self.inline
    }

    /// Child context: same rules, flags changed by `overlay`
    pub fn derive(&self, overlay: impl FnOnce(&mut BlockState)) -> Self {
        let mut state = self.state;
        overlay(&mut state);
        Self {
            rules: Arc::clone(&self.rules),
            inline: self.inline.clone(),
            state,
        }
    }

    /// Run the block engine over `text`
    pub fn parse(&self, text: &str) -> Result<Vec<Token>, EngineError> {
        run(text, self)
    }

    /// Whether some rule would end an open paragraph at `pos`
    pub fn interrupts_at(&self, input: &str, pos: usize) -> bool {
        self.rules.iter().any(|rule| rule.interrupts(input, pos, self))
    }
}

impl Scope for BlockContext {
    const PASS: Pass = Pass::Block;

    #[inline]
    fn rules(&self) -> &[Arc<dyn Rule<Self>>] {
        &self.rules
    }
}

impl fmt::Debug for BlockContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockContext")
            .field("rules", &rule_names(&self.rules))
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Inline pass
// ============================================================================

/// Flags visible to inline rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineState {
    /// Inside link text (links and bare URLs are not recognized)
    pub in_link: bool,
    /// Inside a table cell (`\|` in code spans becomes `|`)
    pub in_table_cell: bool,
    /// Number of enclosing spans
    pub depth: usize,
    /// Limit on `depth`
    pub max_depth: usize,
}

impl InlineState {
    /// Whether a span rule may open another nested span
    #[inline]
    pub fn can_nest(&self) -> bool {
        self.depth < self.max_depth
    }
}

impl Default for InlineState {
    fn default() -> Self {
        Self {
            in_link: false,
            in_table_cell: false,
            depth: 0,
            max_depth: DEFAULT_MAX_INLINE_DEPTH,
        }
    }
}

/// Environment of an inline engine run
#[derive(Clone)]
pub struct InlineContext {
    rules: RuleSet<InlineContext>,
    references: Arc<LinkReferences>,
    state: InlineState,
    scans: Arc<ScanCache>,
}

impl InlineContext {
    /// Create a root inline context
    pub fn new(
        rules: RuleSet<InlineContext>,
        references: Arc<LinkReferences>,
        state: InlineState,
    ) -> Self {
        Self {
            rules,
            references,
            state,
            scans: Arc::new(ScanCache::new()),
        }
    }

    /// Parse-time flags
    #[inline]
    pub fn state(&self) -> &InlineState {
        &self.state
    }

    /// Link-reference definitions of the document
    #[inline]
    pub fn references(&self) -> &LinkReferences {
        &self.references
    }

    /// Lookahead results of the current run
    #[inline]
    pub fn scans(&self) -> &ScanCache {
        &self.scans
    }

    /// Same context with another reference table
    pub fn with_references(&self, references: Arc<LinkReferences>) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            references,
            state: self.state,
            scans: Arc::new(ScanCache::new()),
        }
    }

    /// Child context: same rules and references, flags changed by `overlay`
    pub fn derive(&self, overlay: impl FnOnce(&mut InlineState)) -> Self {
        let mut state = self.state;
        overlay(&mut state);
        Self {
            rules: Arc::clone(&self.rules),
            references: Arc::clone(&self.references),
            state,
            scans: Arc::new(ScanCache::new()),
        }
    }

    /// Context for the content of a nested span, or `None` at the depth limit
    pub fn nested(&self) -> Option<Self> {
        if !self.state.can_nest() {
            log_debug!("inline nesting limit {} reached", self.state.max_depth);
            return None;
        }
        Some(self.derive(|s| s.depth += 1))
    }

    /// Run the inline engine over `text`, merging adjacent text runs
    pub fn parse(&self, text: &str) -> Result<Vec<Token>, EngineError> {
        Ok(coalesce_text(run(text, self)?))
    }
}

impl Scope for InlineContext {
    const PASS: Pass = Pass::Inline;

    #[inline]
    fn rules(&self) -> &[Arc<dyn Rule<Self>>] {
        &self.rules
    }

    /// Scan results are offsets into one scope text, so every run starts
    /// with an empty cache
    fn for_run(&self) -> Option<Self> {
        Some(self.derive(|_| {}))
    }
}

impl fmt::Debug for InlineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineContext")
            .field("rules", &rule_names(&self.rules))
            .field("references", &self.references.len())
            .field("state", &self.state)
            .field("scans", &self.scans.len())
            .finish()
    }
}

fn rule_names<C>(rules: &[Arc<dyn Rule<C>>]) -> Vec<&str> {
    rules.iter().map(|r| r.name()).collect()
}
