//! Property-based tests using proptest
//!
//! These tests check engine guarantees that must hold for any input:
//! parsing terminates without error within a bounded number of rule
//! applications, top-level spans tile the source, and the result is
//! deterministic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use markdialect::prelude::{Applied, BlockContext, EngineError, InlineContext, Match, Rule};
use markdialect::{parse, Dialect, Document, Span, Token, TokenKind};
use proptest::prelude::*;

fn check_tiling(doc: &Document, len: usize) -> Result<(), TestCaseError> {
    let mut pos = 0;
    for token in &doc.tokens {
        prop_assert_eq!(token.span.start, pos);
        prop_assert!(token.span.end > token.span.start);
        pos = token.span.end;
    }
    prop_assert_eq!(pos, len);
    Ok(())
}

/// Lines built from the characters the built-in rules react to
fn markdown_like() -> impl Strategy<Value = String> {
    let line = prop_oneof![
        "[a-z ]{0,12}",
        "#{1,7} [a-z]{1,5}",
        "(> ){1,4}[a-z*_]{0,6}",
        "( {0,4})[-*+] [a-z`]{0,6}",
        "[0-9]{1,3}[.)] [a-z]{0,5}",
        "(```|~~~)[a-z]{0,4}",
        "\\| ?[a-z]{0,3} ?\\|( ?[a-z]{0,3} ?\\|)?",
        "\\|?:?-{1,3}:?\\|?",
        "\\[[a-z]{1,4}\\]: /[a-z]{1,4}",
        "[a-z*_~`\\[\\]()<>!\\\\ ]{0,16}",
        "(---|\\*\\*\\*|===)",
        "<(div|!--|/div)>?",
    ];
    prop::collection::vec(line, 0..12).prop_map(|lines| lines.join("\n"))
}

/// Delegates to another rule, counting its applications in root scopes
struct Counting<C: 'static> {
    inner: Arc<dyn Rule<C>>,
    at_root: fn(&C) -> bool,
    applied: Arc<AtomicUsize>,
}

impl<C: 'static> Rule<C> for Counting<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn try_match(&self, input: &str, pos: usize, cx: &C) -> Option<Match> {
        self.inner.try_match(input, pos, cx)
    }

    fn apply(&self, m: &Match, input: &str, cx: &C) -> Result<Applied, EngineError> {
        if (self.at_root)(cx) {
            self.applied.fetch_add(1, Ordering::Relaxed);
        }
        self.inner.apply(m, input, cx)
    }

    fn interrupts(&self, input: &str, pos: usize, cx: &C) -> bool {
        self.inner.interrupts(input, pos, cx)
    }

    fn is_fallback(&self) -> bool {
        self.inner.is_fallback()
    }
}

/// GFM with every rule wrapped in [`Counting`]
///
/// Returns the dialect plus the application counters of the document's
/// block run and of the root inline runs (one per inline-bearing block).
fn counting_gfm() -> (Dialect, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let gfm = Dialect::gfm();
    let block = Arc::new(AtomicUsize::new(0));
    let inline = Arc::new(AtomicUsize::new(0));

    let mut builder = gfm.to_builder().name("counting-gfm");
    for rule in gfm.block_rules().iter() {
        builder = builder.replace_block(
            rule.name(),
            Counting {
                inner: Arc::clone(rule),
                at_root: |cx: &BlockContext| cx.state().nesting() == 0,
                applied: Arc::clone(&block),
            },
        );
    }
    for rule in gfm.inline_rules().iter() {
        builder = builder.replace_inline(
            rule.name(),
            Counting {
                inner: Arc::clone(rule),
                at_root: |cx: &InlineContext| cx.state().depth == 0,
                applied: Arc::clone(&inline),
            },
        );
    }

    let dialect = builder.build().unwrap();
    assert_eq!(dialect.block_rule_names(), gfm.block_rule_names());
    assert_eq!(dialect.inline_rule_names(), gfm.inline_rule_names());
    (dialect, block, inline)
}

// =============================================================================
// Termination and Coverage
// =============================================================================

proptest! {
    /// Arbitrary text never fails with the built-in dialects
    #[test]
    fn test_arbitrary_input_parses(s in "\\PC{0,200}") {
        prop_assert!(parse(&s, &Dialect::markdown()).is_ok());
        prop_assert!(parse(&s, &Dialect::gfm()).is_ok());
    }

    /// Every application consumes input, so a run over `n` bytes applies
    /// at most `n` rules. Root inline runs cover disjoint parts of the
    /// source, so together they stay within the same bound.
    #[test]
    fn test_rule_applications_are_bounded(s in markdown_like()) {
        let (dialect, block, inline) = counting_gfm();
        let doc = parse(&s, &dialect).unwrap();
        prop_assert_eq!(&doc, &parse(&s, &Dialect::gfm()).unwrap());

        let block = block.load(Ordering::Relaxed);
        let inline = inline.load(Ordering::Relaxed);
        prop_assert!(block <= s.len(), "{} block applications for {} bytes", block, s.len());
        prop_assert!(inline <= s.len(), "{} inline applications for {} bytes", inline, s.len());
        prop_assert!(s.is_empty() || block >= 1);
    }

    /// Top-level blocks cover the source exactly once
    #[test]
    fn test_top_level_spans_tile(s in markdown_like()) {
        for dialect in [Dialect::markdown(), Dialect::gfm()] {
            let doc = parse(&s, &dialect).unwrap();
            check_tiling(&doc, s.len())?;
        }
    }

    /// Arbitrary unicode also tiles
    #[test]
    fn test_unicode_spans_tile(s in "\\PC{0,120}") {
        let doc = parse(&s, &Dialect::gfm()).unwrap();
        check_tiling(&doc, s.len())?;
    }

    /// Parsing the same input twice gives equal documents
    #[test]
    fn test_parse_is_deterministic(s in markdown_like()) {
        let dialect = Dialect::gfm();
        prop_assert_eq!(parse(&s, &dialect).unwrap(), parse(&s, &dialect).unwrap());
    }

    /// No deferred placeholders survive the inline pass
    #[test]
    fn test_no_deferred_tokens_remain(s in markdown_like()) {
        let doc = parse(&s, &Dialect::gfm()).unwrap();
        let mut deferred = 0;
        doc.walk(|t| {
            if t.deferred_source().is_some() {
                deferred += 1;
            }
        });
        prop_assert_eq!(deferred, 0);
    }
}

// =============================================================================
// Plain Prose
// =============================================================================

proptest! {
    /// Words separated by single spaces form one paragraph of one text token
    #[test]
    fn test_plain_prose(s in "[a-z]{1,8}( [a-z]{1,8}){0,10}") {
        for dialect in [Dialect::markdown(), Dialect::gfm()] {
            let doc = parse(&s, &dialect).unwrap();
            prop_assert_eq!(doc.tokens.len(), 1);
            prop_assert_eq!(&doc.tokens[0].kind, &TokenKind::Paragraph);
            prop_assert_eq!(
                &doc.tokens[0].children,
                &vec![Token::text(s.clone(), Span::new(0, s.len()))]
            );
        }
    }

    /// Deep blockquotes stay within the nesting limit
    #[test]
    fn test_quote_depth_is_bounded(depth in 1usize..200) {
        let source = format!("{}x", "> ".repeat(depth));
        let doc = parse(&source, &Dialect::markdown()).unwrap();

        let mut quotes = 0;
        let mut token = &doc.tokens[0];
        while token.kind == TokenKind::Blockquote {
            quotes += 1;
            match token.children.first() {
                Some(child) => token = child,
                None => break,
            }
        }
        prop_assert_eq!(quotes, depth.min(32));
    }
}
